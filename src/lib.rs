//! Lay out aligned reads, gene annotations and numeric tracks for a genomic
//! window and render them as layered vector graphics.
//!
//! A [`document::Document`] holds views; each [`document::GenomeView`] owns a
//! [`scale::Scale`] and a stack of tracks. Layout packs intervals into rows,
//! rendering streams [`render::DrawCommand`]s through a clip/offset stack into
//! any [`render::DrawingSink`], such as [`render::SvgWriter`].

pub mod alignment;
pub mod annotation;
pub mod annotator;
pub mod consensus;
pub mod document;
pub mod layout;
pub mod reference;
pub mod region;
pub mod render;
pub mod scale;
pub mod tracks;
