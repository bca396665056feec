use std::{pin::Pin, sync::Arc};

/// Boxed async callback shared between the client and the tasks it drives.
pub(crate) type AsyncFn<Args, Resp> =
    dyn Fn(Args) -> Pin<Box<dyn Future<Output = Resp> + Send + 'static>> + Send + Sync + 'static;

pub(crate) fn wrap_fn<F, Fut, Args, Resp>(h: F) -> Arc<AsyncFn<Args, Resp>>
where
    F: Fn(Args) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Resp> + Send + 'static,
{
    Arc::new(move |args| Box::pin(h(args)))
}
