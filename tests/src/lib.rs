#[cfg(test)]
mod network;
