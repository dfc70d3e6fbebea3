use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Two-stage interrupt handling for a run.
///
/// The first signal cancels `token`, which ends the run after the commit in
/// flight. A second signal makes this return `true` so the caller can exit
/// without waiting for a slow inference call. Returns `false` if signals can't
/// be received at all.
pub async fn watch_interrupts<F, Fut>(token: CancellationToken, mut next_signal: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = next_signal().await {
        tracing::warn!("Could not listen for Ctrl-C: {}", e);
        return false;
    }
    tracing::warn!("Interrupt received; stopping after the current commit (Ctrl-C again to quit now)");
    token.cancel();

    next_signal().await.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::{Mutex, mpsc};

    fn signals() -> (
        mpsc::UnboundedSender<std::io::Result<()>>,
        impl FnMut() -> std::pin::Pin<Box<dyn Future<Output = std::io::Result<()>> + Send>>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let rx = Arc::new(Mutex::new(rx));
        let next = move || {
            let rx = rx.clone();
            Box::pin(async move {
                match rx.lock().await.recv().await {
                    Some(signal) => signal,
                    None => std::future::pending().await,
                }
            }) as std::pin::Pin<Box<dyn Future<Output = std::io::Result<()>> + Send>>
        };
        (tx, next)
    }

    #[tokio::test]
    async fn test_first_interrupt_cancels_second_forces_exit() {
        let token = CancellationToken::new();
        let (tx, next) = signals();
        let watcher = tokio::spawn(watch_interrupts(token.clone(), next));

        tx.send(Ok(())).unwrap();
        token.cancelled().await;
        assert!(!watcher.is_finished());

        tx.send(Ok(())).unwrap();
        assert!(watcher.await.unwrap());
    }

    #[tokio::test]
    async fn test_unavailable_signals_leave_run_alone() {
        let token = CancellationToken::new();
        let (tx, next) = signals();
        tx.send(Err(std::io::Error::other("no signal driver"))).unwrap();

        assert!(!watch_interrupts(token.clone(), next).await);
        assert!(!token.is_cancelled());
    }
}
