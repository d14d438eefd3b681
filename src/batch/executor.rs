//! Batch executor seam: what the batcher calls to send one dispatch.

use crate::Result;
use async_trait::async_trait;
use std::future::Future;
use std::marker::PhantomData;

/// A request that can be folded into a batch.
pub trait BatchRequest {
    /// Canonical identity used to deduplicate concurrent identical requests.
    fn dedup_key(&self) -> String;
}

/// Sends one dispatch and returns per-item results in request order.
///
/// An `Err` from `execute` fails every request in the dispatch. A result vector
/// shorter than the request list fails the requests without a result.
#[async_trait]
pub trait BatchExecutor: Send + Sync + 'static {
    type Request: BatchRequest + Clone + Send + Sync + 'static;
    type Output: Clone + Send + 'static;

    async fn execute(
        &self,
        requests: Vec<Self::Request>,
    ) -> Result<Vec<Result<Self::Output>>>;
}

/// Adapts a closure into a [`BatchExecutor`].
pub struct FnExecutor<Req, Out, F, Fut> {
    f: F,
    _marker: PhantomData<fn(Req) -> (Out, Fut)>,
}

pub fn executor_fn<Req, Out, F, Fut>(f: F) -> FnExecutor<Req, Out, F, Fut>
where
    F: Fn(Vec<Req>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<Result<Out>>>> + Send + 'static,
{
    FnExecutor {
        f,
        _marker: PhantomData,
    }
}

#[async_trait]
impl<Req, Out, F, Fut> BatchExecutor for FnExecutor<Req, Out, F, Fut>
where
    Req: BatchRequest + Clone + Send + Sync + 'static,
    Out: Clone + Send + 'static,
    F: Fn(Vec<Req>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<Result<Out>>>> + Send + 'static,
{
    type Request = Req;
    type Output = Out;

    async fn execute(&self, requests: Vec<Req>) -> Result<Vec<Result<Out>>> {
        (self.f)(requests).await
    }
}
