pub mod backend;
pub mod constants;
pub mod gesture;
pub mod headless;
pub mod intake;
pub mod mode;
pub mod particle;
pub mod picking;
pub mod placement;
pub mod scene;
pub mod state;

pub use backend::*;
pub use constants::*;
pub use gesture::*;
pub use headless::*;
pub use intake::*;
pub use mode::*;
pub use particle::*;
pub use picking::*;
pub use placement::*;
pub use scene::*;
pub use state::*;
