use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;

/// A deferred asynchronous computation with two outcomes.
///
/// `Task` wraps a routine producing a `Result<A, E>` future. The routine is
/// only invoked when the task is forked or run, and it is invoked once per
/// fork — clones share the routine, not any result.
pub struct Task<E, A> {
    thunk: Arc<dyn Fn() -> BoxFuture<'static, Result<A, E>> + Send + Sync>,
}

impl<E, A> Clone for Task<E, A> {
    fn clone(&self) -> Self {
        Self {
            thunk: Arc::clone(&self.thunk),
        }
    }
}

impl<E, A> Task<E, A>
where
    E: Send + 'static,
    A: Send + 'static,
{
    /// Create a task from its initiation routine.
    ///
    /// The routine is not called here; it runs once per [`fork`](Self::fork)
    /// or [`run`](Self::run).
    pub fn new<F, Fut>(thunk: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<A, E>> + Send + 'static,
    {
        Self {
            thunk: Arc::new(move || Box::pin(thunk())),
        }
    }

    /// A task that resolves with `value` on every fork.
    pub fn resolved(value: A) -> Self
    where
        A: Clone + Sync,
    {
        Self::new(move || {
            let value = value.clone();
            async move { Ok(value) }
        })
    }

    /// A task that rejects with `error` on every fork.
    pub fn rejected(error: E) -> Self
    where
        E: Clone + Sync,
    {
        Self::new(move || {
            let error = error.clone();
            async move { Err(error) }
        })
    }

    /// Start the task and hand its outcome to exactly one continuation.
    ///
    /// The routine runs from scratch on each call. Control returns to the
    /// caller only once the routine's future settles; a routine whose future
    /// never resolves leaves the fork pending.
    pub async fn fork<T>(
        &self,
        on_reject: impl FnOnce(E) -> T,
        on_resolve: impl FnOnce(A) -> T,
    ) -> T {
        match (self.thunk)().await {
            Err(e) => on_reject(e),
            Ok(v) => on_resolve(v),
        }
    }

    /// Start the task and return its outcome as a `Result`.
    ///
    /// Equivalent to forking with the identity continuations.
    pub async fn run(&self) -> Result<A, E> {
        (self.thunk)().await
    }

    /// Transform the success value. Lazy: `f` runs only on forks that resolve.
    pub fn map<B, F>(self, f: F) -> Task<E, B>
    where
        B: Send + 'static,
        F: Fn(A) -> B + Send + Sync + 'static,
    {
        let thunk = self.thunk;
        let f = Arc::new(f);
        Task {
            thunk: Arc::new(move || {
                let fut = thunk();
                let f = Arc::clone(&f);
                Box::pin(async move { fut.await.map(|a| f(a)) })
            }),
        }
    }

    /// Transform the failure value. Lazy: `f` runs only on forks that reject.
    pub fn map_err<E2, F>(self, f: F) -> Task<E2, A>
    where
        E2: Send + 'static,
        F: Fn(E) -> E2 + Send + Sync + 'static,
    {
        let thunk = self.thunk;
        let f = Arc::new(f);
        Task {
            thunk: Arc::new(move || {
                let fut = thunk();
                let f = Arc::clone(&f);
                Box::pin(async move { fut.await.map_err(|e| f(e)) })
            }),
        }
    }

    /// Sequence a dependent task after this one.
    ///
    /// The second task is built and run only when the first resolves, which
    /// is the one ordering guarantee this primitive offers: independent forks
    /// are unordered.
    pub fn and_then<B, F>(self, f: F) -> Task<E, B>
    where
        B: Send + 'static,
        F: Fn(A) -> Task<E, B> + Send + Sync + 'static,
    {
        let thunk = self.thunk;
        let f = Arc::new(f);
        Task {
            thunk: Arc::new(move || {
                let fut = thunk();
                let f = Arc::clone(&f);
                Box::pin(async move {
                    let a = fut.await?;
                    f(a).run().await
                })
            }),
        }
    }
}

impl<E, A> std::fmt::Debug for Task<E, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    fn counting_task(counter: &Arc<AtomicUsize>) -> Task<String, usize> {
        let counter = Arc::clone(counter);
        Task::new(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move { Ok(n) }
        })
    }

    // -----------------------------------------------------------------------
    // Outcome delivery
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn fork_resolves_with_value() {
        let task: Task<String, i32> = Task::new(|| async { Ok(42) });
        let out = task
            .fork(|e| panic!("unexpected reject: {e}"), |v| v * 2)
            .await;
        assert_eq!(out, 84);
    }

    #[tokio::test]
    async fn fork_rejects_with_error() {
        let task: Task<String, i32> = Task::new(|| async { Err("boom".to_string()) });
        let out = task.fork(|e| e, |v| panic!("unexpected resolve: {v}")).await;
        assert_eq!(out, "boom");
    }

    #[tokio::test]
    async fn run_returns_result() {
        let ok: Task<String, i32> = Task::resolved(7);
        assert_eq!(ok.run().await, Ok(7));

        let err: Task<String, i32> = Task::rejected("nope".to_string());
        assert_eq!(err.run().await, Err("nope".to_string()));
    }

    // -----------------------------------------------------------------------
    // Laziness / re-fork semantics
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn no_work_before_fork() {
        let counter = Arc::new(AtomicUsize::new(0));
        let task = counting_task(&counter);
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        task.run().await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn forking_twice_reruns_the_routine() {
        let counter = Arc::new(AtomicUsize::new(0));
        let task = counting_task(&counter);

        let first = task.run().await.unwrap();
        let second = task.run().await.unwrap();
        assert_eq!((first, second), (1, 2));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn clones_share_the_routine_not_results() {
        let counter = Arc::new(AtomicUsize::new(0));
        let task = counting_task(&counter);
        let clone = task.clone();

        task.run().await.unwrap();
        clone.run().await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    // -----------------------------------------------------------------------
    // Combinators
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn map_transforms_success_only() {
        let ok: Task<String, i32> = Task::resolved(10);
        assert_eq!(ok.map(|v| v + 1).run().await, Ok(11));

        let err: Task<String, i32> = Task::rejected("e".to_string());
        assert_eq!(err.map(|v| v + 1).run().await, Err("e".to_string()));
    }

    #[tokio::test]
    async fn map_err_transforms_failure_only() {
        let err: Task<String, i32> = Task::rejected("low".to_string());
        assert_eq!(
            err.map_err(|e| e.to_uppercase()).run().await,
            Err("LOW".to_string())
        );

        let ok: Task<String, i32> = Task::resolved(3);
        assert_eq!(ok.map_err(|e| format!("{e}!")).run().await, Ok(3));
    }

    #[tokio::test]
    async fn map_is_lazy() {
        let counter = Arc::new(AtomicUsize::new(0));
        let task = counting_task(&counter).map(|v| v * 10);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert_eq!(task.run().await, Ok(10));
    }

    #[tokio::test]
    async fn and_then_sequences_dependent_tasks() {
        let log: Arc<std::sync::Mutex<Vec<&'static str>>> =
            Arc::new(std::sync::Mutex::new(Vec::new()));

        let first_log = Arc::clone(&log);
        let first: Task<String, i32> = Task::new(move || {
            first_log.lock().unwrap().push("first");
            async { Ok(1) }
        });

        let second_log = Arc::clone(&log);
        let chained = first.and_then(move |v| {
            let second_log = Arc::clone(&second_log);
            Task::new(move || {
                second_log.lock().unwrap().push("second");
                async move { Ok(v + 1) }
            })
        });

        assert_eq!(chained.run().await, Ok(2));
        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn and_then_short_circuits_on_reject() {
        let counter = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&counter);
        let task: Task<String, i32> = Task::rejected("stop".to_string());
        let chained = task.and_then(move |v| {
            inner.fetch_add(1, Ordering::SeqCst);
            Task::resolved(v)
        });

        assert_eq!(chained.run().await, Err("stop".to_string()));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
