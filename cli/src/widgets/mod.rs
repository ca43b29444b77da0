pub mod button;
pub mod util;
pub mod volume_slider;
