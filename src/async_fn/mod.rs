mod async_fn;

pub(crate) use async_fn::*;
