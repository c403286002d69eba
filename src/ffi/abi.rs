#[unsafe(no_mangle)]
/// ### English
/// Returns the C ABI version.
///
/// ### 中文
/// 返回 C ABI 版本号。
pub extern "C" fn video_surface_abi_version() -> u32 {
    super::VIDEO_SURFACE_ABI_VERSION
}
