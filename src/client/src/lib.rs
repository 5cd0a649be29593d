pub mod entrypoint;
pub mod model {
    pub mod external;
    pub mod internal;
}
pub mod service {
    pub mod controller;
    pub mod input;
    pub mod opponent;
    pub mod pacing;
    pub mod report;
    pub mod view;
}
