pub mod clock;
pub mod queues;
