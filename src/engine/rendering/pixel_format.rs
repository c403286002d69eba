//! ### English
//! Pixel-format negotiation for the surface's GPU context.
//!
//! Candidates are tried from the richest attribute set down to progressively fewer attributes,
//! optionally ending with the software renderer. The first format the platform accepts wins.
//!
//! ### 中文
//! surface GPU 上下文的像素格式协商。
//!
//! 候选格式从属性最完整的开始，逐步减少属性依次尝试，可选地以软件渲染器收尾。
//! 平台接受的第一个格式胜出。

use tracing::{debug, warn};

use crate::engine::error::SurfaceError;
use crate::engine::external::{GpuContext, GpuContextFactory};
use crate::engine::flags::{
    self, VIDEO_SURFACE_FLAG_ALLOW_SOFTWARE_RENDERER, VIDEO_SURFACE_FLAG_DEEP_COLOR,
};

/// ### English
/// One pixel-format attribute.
///
/// ### 中文
/// 单个像素格式属性。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormatAttribute {
    /// Core (3.2+) GL profile.
    CoreProfile,
    /// Hardware-accelerated renderer only.
    Accelerated,
    /// Double-buffered drawable.
    DoubleBuffer,
    /// Total color bits per pixel.
    ColorSize(u8),
    /// Floating-point color components.
    ColorFloat,
    /// Alpha bits per pixel.
    AlphaSize(u8),
    /// Allow renderers not attached to a display (e.g. a discrete GPU that is powered down).
    AllowOfflineRenderers,
    /// Generic software renderer.
    SoftwareRenderer,
}

impl PixelFormatAttribute {
    /// ### English
    /// Encodes the attribute as a `(tag, value)` pair for the C ABI.
    ///
    /// ### 中文
    /// 将属性编码为 C ABI 使用的 `(tag, value)` 对。
    pub fn encode(self) -> [u32; 2] {
        match self {
            Self::CoreProfile => [1, 0],
            Self::Accelerated => [2, 0],
            Self::DoubleBuffer => [3, 0],
            Self::ColorSize(bits) => [4, u32::from(bits)],
            Self::ColorFloat => [5, 0],
            Self::AlphaSize(bits) => [6, u32::from(bits)],
            Self::AllowOfflineRenderers => [7, 0],
            Self::SoftwareRenderer => [8, 0],
        }
    }
}

/// ### English
/// Ordered attribute list describing one pixel format.
///
/// ### 中文
/// 描述一种像素格式的有序属性列表。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelFormatDescriptor {
    attributes: Vec<PixelFormatAttribute>,
}

impl PixelFormatDescriptor {
    pub fn new(attributes: Vec<PixelFormatAttribute>) -> Self {
        Self { attributes }
    }

    pub fn attributes(&self) -> &[PixelFormatAttribute] {
        &self.attributes
    }

    pub fn contains(&self, attribute: PixelFormatAttribute) -> bool {
        self.attributes.contains(&attribute)
    }

    pub fn is_software(&self) -> bool {
        self.contains(PixelFormatAttribute::SoftwareRenderer)
    }

    /// ### English
    /// Flattens the attributes into `(tag, value)` pairs.
    ///
    /// ### 中文
    /// 将属性展平为 `(tag, value)` 对序列。
    pub fn encode(&self) -> Vec<u32> {
        self.attributes
            .iter()
            .flat_map(|attribute| attribute.encode())
            .collect()
    }

    fn without(&self, attribute: PixelFormatAttribute) -> Self {
        Self::new(
            self.attributes
                .iter()
                .copied()
                .filter(|a| *a != attribute)
                .collect(),
        )
    }
}

/// ### English
/// Candidate formats in negotiation order for `surface_flags`.
///
/// ### 中文
/// 按协商顺序返回 `surface_flags` 对应的候选格式。
pub fn candidate_formats(surface_flags: u32) -> Vec<PixelFormatDescriptor> {
    use PixelFormatAttribute::*;

    let standard = PixelFormatDescriptor::new(vec![
        CoreProfile,
        Accelerated,
        DoubleBuffer,
        AllowOfflineRenderers,
        ColorSize(32),
        AlphaSize(8),
    ]);

    let mut candidates = Vec::with_capacity(6);
    if flags::has(surface_flags, VIDEO_SURFACE_FLAG_DEEP_COLOR) {
        candidates.push(PixelFormatDescriptor::new(vec![
            CoreProfile,
            Accelerated,
            DoubleBuffer,
            AllowOfflineRenderers,
            ColorSize(64),
            ColorFloat,
            AlphaSize(16),
        ]));
    }

    let no_offline = standard.without(AllowOfflineRenderers);
    let no_accel = no_offline.without(Accelerated);
    let minimal = PixelFormatDescriptor::new(vec![CoreProfile]);
    candidates.extend([standard, no_offline, no_accel, minimal]);

    if flags::has(surface_flags, VIDEO_SURFACE_FLAG_ALLOW_SOFTWARE_RENDERER) {
        candidates.push(PixelFormatDescriptor::new(vec![
            CoreProfile,
            DoubleBuffer,
            SoftwareRenderer,
        ]));
    }
    candidates
}

/// ### English
/// Tries every candidate format until `factory` creates a context.
///
/// #### Parameters
/// - `factory`: Platform context factory.
/// - `surface_flags`: `VIDEO_SURFACE_FLAG_*` bitmask.
///
/// ### 中文
/// 依次尝试所有候选格式，直到 `factory` 成功创建上下文。
///
/// #### 参数
/// - `factory`：平台上下文工厂。
/// - `surface_flags`：`VIDEO_SURFACE_FLAG_*` 位掩码。
pub fn negotiate(
    factory: &dyn GpuContextFactory,
    surface_flags: u32,
) -> Result<(PixelFormatDescriptor, Box<dyn GpuContext>), SurfaceError> {
    let candidates = candidate_formats(surface_flags);
    let attempts = candidates.len();

    for (index, format) in candidates.into_iter().enumerate() {
        match factory.create_context(&format) {
            Ok(context) => {
                debug!(
                    attempt = index + 1,
                    software = format.is_software(),
                    "pixel format negotiated"
                );
                return Ok((format, context));
            }
            Err(err) => {
                warn!(attempt = index + 1, ?format, %err, "pixel format rejected");
            }
        }
    }

    Err(SurfaceError::NoCompatiblePixelFormat { attempts })
}
