mod trajectory;

pub use trajectory::Trajectory;
