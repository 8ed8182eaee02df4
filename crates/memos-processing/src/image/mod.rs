mod orientation;

pub use orientation::ImageOrientation;
