pub mod allocation;
pub mod election;
