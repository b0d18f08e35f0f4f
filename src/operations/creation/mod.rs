mod make_face;

pub use make_face::MakeFace;
