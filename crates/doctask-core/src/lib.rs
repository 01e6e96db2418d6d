//! Lazy, two-outcome asynchronous computations.
//!
//! A [`Task`] describes an asynchronous operation with exactly two possible
//! outcomes (failure `E`, success `A`) that performs no work until it is
//! explicitly started. Construction is cheap and side-effect free; the only
//! way to observe a result is to [`fork`](Task::fork) (or [`run`](Task::run))
//! the task, which invokes the underlying routine from scratch every time.
//!
//! # Design Rules
//!
//! 1. No work before fork. Building a `Task` never touches the outside world.
//! 2. Exactly one outcome per fork. The routine yields a `Result`, so firing
//!    both continuations (or one of them twice) is unrepresentable.
//! 3. No memoization. Forking twice re-invokes the routine twice; a settled
//!    task is not reusable state, just a description that can be re-run.
//! 4. No built-in timeout, cancellation, or retry. Those are layered on by
//!    callers, not baked into the primitive.

mod task;

pub use task::Task;
