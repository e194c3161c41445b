use std::time::Duration;

use rdpc101::CancelFlag;
use tokio_util::sync::CancellationToken;

static CANCEL: tokio::sync::OnceCell<CancellationToken> = tokio::sync::OnceCell::const_new();

pub struct Quit(CancellationToken);

impl Quit {
    /// Returns when the program has been asked to quit by the OS.
    pub async fn quit(&self) {
        self.0.cancelled().await
    }

    /// Raise `cancel` once a quit is requested, then give the tuner work
    /// `grace` to wind down before returning.
    ///
    /// A status read has no deadline of its own, so the caller exits the
    /// process if this ever returns.
    pub async fn cancel_with_grace(&self, cancel: &CancelFlag, grace: Duration) {
        self.quit().await;
        cancel.cancel();
        tokio::time::sleep(grace).await;
    }
}

#[cfg(unix)]
fn watch(cancel: &CancellationToken, kind: tokio::signal::unix::SignalKind, name: &'static str) {
    let cancel_tx = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::unix::signal(kind) {
            Ok(mut sig) => {
                sig.recv().await;
                tracing::debug!(signal = name, "quit requested");
                cancel_tx.cancel();
            }
            Err(e) => tracing::warn!(signal = name, "couldn't watch for signal: {e}"),
        }
    });
}

pub async fn quit_watch() -> Quit {
    let cancel = CANCEL
        .get_or_init(|| async move {
            let cancel = CancellationToken::new();
            #[cfg(unix)]
            {
                use tokio::signal::unix::SignalKind;

                watch(&cancel, SignalKind::interrupt(), "SIGINT");
                watch(&cancel, SignalKind::hangup(), "SIGHUP");
                watch(&cancel, SignalKind::terminate(), "SIGTERM");
                watch(&cancel, SignalKind::quit(), "SIGQUIT");
            }
            #[cfg(windows)]
            {
                // ctrl-c
                let cancel_tx = cancel.clone();
                tokio::spawn(async move {
                    match tokio::signal::ctrl_c().await {
                        Ok(()) => cancel_tx.cancel(),
                        Err(e) => tracing::warn!("couldn't watch for ctrl-c: {e}"),
                    }
                });
            }
            cancel
        })
        .await;
    let cancel = cancel.clone();

    Quit(cancel)
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    #[tokio::test]
    async fn grace_starts_at_quit() {
        let token = CancellationToken::new();
        let quit = Quit(token.clone());
        let cancel = CancelFlag::new();

        let early = tokio::time::timeout(
            Duration::from_millis(20),
            quit.cancel_with_grace(&cancel, Duration::ZERO),
        )
        .await;
        assert!(early.is_err());
        assert!(!cancel.is_cancelled());

        token.cancel();
        let start = Instant::now();
        quit.cancel_with_grace(&cancel, Duration::from_millis(20)).await;
        assert!(cancel.is_cancelled());
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
