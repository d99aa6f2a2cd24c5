// src/intake/debounce.rs

use std::{
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

type Action<A> = Arc<dyn Fn(A) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Debounce de vaga única: a primeira chamada arma o timer, as seguintes
/// só trocam os argumentos pendentes. Quando o timer dispara, roda com o
/// último valor recebido.
pub struct Debouncer<A> {
    wait: Duration,
    action: Action<A>,
    pending: Arc<Mutex<Option<A>>>,
}

impl<A> Clone for Debouncer<A> {
    fn clone(&self) -> Self {
        Self {
            wait: self.wait,
            action: self.action.clone(),
            pending: self.pending.clone(),
        }
    }
}

impl<A: Send + 'static> Debouncer<A> {
    pub fn new<F, Fut>(wait: Duration, action: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            wait,
            action: Arc::new(move |args| -> Pin<Box<dyn Future<Output = ()> + Send>> {
                Box::pin(action(args))
            }),
            pending: Arc::new(Mutex::new(None)),
        }
    }

    /// Devolve `true` quando esta chamada armou um novo timer.
    pub fn call(&self, args: A) -> bool {
        let armed = {
            let mut slot = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            let idle = slot.is_none();
            *slot = Some(args);
            idle
        };
        if !armed {
            return false;
        }

        let wait = self.wait;
        let action = self.action.clone();
        let pending = self.pending.clone();
        tokio::spawn(async move {
            tokio::time::sleep(wait).await;
            let latest = pending
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            if let Some(args) = latest {
                action(args).await;
            }
        });
        true
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, Debouncer<String>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = calls.clone();
        let debouncer = Debouncer::new(Duration::from_millis(30), move |term: String| {
            let sink = sink.clone();
            async move {
                sink.lock().unwrap().push(term);
            }
        });
        (calls, debouncer)
    }

    #[tokio::test]
    async fn burst_runs_once_with_the_latest_arguments() {
        let (calls, debouncer) = recorder();

        assert!(debouncer.call("s".into()));
        assert!(!debouncer.call("sa".into()));
        assert!(!debouncer.call("said".into()));
        assert!(debouncer.is_pending());

        tokio::time::sleep(Duration::from_millis(120)).await;

        assert_eq!(*calls.lock().unwrap(), vec!["said".to_string()]);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test]
    async fn separate_bursts_run_separately() {
        let (calls, debouncer) = recorder();

        debouncer.call("amal".into());
        tokio::time::sleep(Duration::from_millis(120)).await;
        debouncer.call("omar".into());
        tokio::time::sleep(Duration::from_millis(120)).await;

        assert_eq!(
            *calls.lock().unwrap(),
            vec!["amal".to_string(), "omar".to_string()]
        );
    }
}
