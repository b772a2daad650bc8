//! Unix-specific platform support.

/// Block delivery of all asynchronous signals on the calling thread.
///
/// The dispatch thread calls this once at startup so host signals are always
/// routed to caller threads, never to the thread invoking handlers.
pub(crate) fn mask_async_signals() {
    let mut mask = std::mem::MaybeUninit::<libc::sigset_t>::uninit();

    // SAFETY: sigfillset initializes the sigset_t we own; the pointer is
    // valid for the duration of the call.
    let rc = unsafe { libc::sigfillset(mask.as_mut_ptr()) };
    if rc != 0 {
        tracing::warn!("sigfillset failed; dispatch thread signals not masked");
        return;
    }

    // SAFETY: the mask was initialized by sigfillset above; pthread_sigmask
    // only reads it and updates the calling thread's signal mask.
    let rc =
        unsafe { libc::pthread_sigmask(libc::SIG_BLOCK, mask.as_ptr(), std::ptr::null_mut()) };
    if rc != 0 {
        tracing::warn!(rc, "pthread_sigmask failed; dispatch thread signals not masked");
    }
}
