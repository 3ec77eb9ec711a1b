pub mod colormap;
pub mod image;
