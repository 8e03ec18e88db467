/// Asynchronous advantage actor-critic
pub mod a3c;
