/// Identifier of the CPU the calling thread is currently running on.
///
/// Used to attribute records on multi-core hosts. Falls back to 0 when the
/// platform cannot tell.
#[cfg(target_os = "linux")]
pub fn current_cpu() -> u32 {
    // SAFETY: sched_getcpu takes no arguments and only reads scheduler state.
    #[allow(unsafe_code)]
    let cpu = unsafe { libc::sched_getcpu() };
    u32::try_from(cpu).unwrap_or(0)
}

#[cfg(not(target_os = "linux"))]
pub fn current_cpu() -> u32 {
    0
}
