pub mod audio;
pub mod wav;
