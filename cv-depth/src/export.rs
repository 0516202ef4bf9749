use crate::{DepthError, MHPack, Result};
use cv_core::nalgebra::Vector3;
use log::*;
use ply_rs::{
    ply::{
        Addable, DefaultElement, ElementDef, Encoding, Ply, Property, PropertyDef, PropertyType,
        ScalarType,
    },
    writer::Writer,
};
use std::io::Write;

/// Writes the cloud of a reconstruction as an ASCII PLY file.
///
/// Every vertex carries its position and the hypothesis slot it came from. A `sigma` property is
/// added when the reconstruction was run with [`ReconstructFlags::sigma_value`]. Both bounds of
/// a [`ReconstructFlags::minmax`] reconstruction are written, with the sigma of their entry.
/// Points the camera could not reconstruct are left out.
///
/// Returns the number of vertices written. A pack whose outputs do not line up with its entries,
/// as a reconstruction leaves them, is rejected before anything is written.
///
/// [`ReconstructFlags::sigma_value`]: crate::ReconstructFlags::sigma_value
/// [`ReconstructFlags::minmax`]: crate::ReconstructFlags::minmax
pub fn export_ply(mut writer: impl Write, pack: &MHPack) -> Result<usize> {
    let entries = pack.len();
    let aligned = pack.hyp_idx_vec.len() == entries
        && (pack.sigma_vec.is_empty() || pack.sigma_vec.len() == entries)
        && (pack.cloud.len() == entries || pack.cloud.len() == 2 * entries);
    if !aligned {
        return Err(DepthError::MisalignedPack {
            entries,
            hypotheses: pack.hyp_idx_vec.len(),
            sigmas: pack.sigma_vec.len(),
            points: pack.cloud.len(),
        });
    }

    let mut ply = Ply::<DefaultElement>::new();
    ply.header.encoding = Encoding::Ascii;
    ply.header
        .comments
        .push("Exported from rust-cv/cv-depth".to_string());

    let with_sigma = !pack.is_empty() && pack.sigma_vec.len() == pack.len();
    let arity = if pack.is_empty() {
        1
    } else {
        (pack.cloud.len() / pack.len()).max(1)
    };

    let mut point_element = ElementDef::new("vertex".to_string());
    for name in ["x", "y", "z"] {
        let p = PropertyDef::new(name.to_string(), PropertyType::Scalar(ScalarType::Double));
        point_element.properties.add(p);
    }
    if with_sigma {
        let p = PropertyDef::new("sigma".to_string(), PropertyType::Scalar(ScalarType::Double));
        point_element.properties.add(p);
    }
    let p = PropertyDef::new("hypothesis".to_string(), PropertyType::Scalar(ScalarType::UInt));
    point_element.properties.add(p);
    ply.header.elements.add(point_element);

    let mut vertices: Vec<DefaultElement> = vec![];
    for (position, p) in pack.cloud.iter().enumerate() {
        if *p == Vector3::zeros() {
            continue;
        }
        let entry = position / arity;
        let mut point = DefaultElement::new();
        point.insert("x".to_string(), Property::Double(p.x));
        point.insert("y".to_string(), Property::Double(p.y));
        point.insert("z".to_string(), Property::Double(p.z));
        if with_sigma {
            point.insert("sigma".to_string(), Property::Double(pack.sigma_vec[entry]));
        }
        point.insert(
            "hypothesis".to_string(),
            Property::UInt(pack.hyp_idx_vec[entry] as u32),
        );
        vertices.push(point);
    }
    let count = vertices.len();
    debug!("exporting {} of {} points", count, pack.cloud.len());
    ply.payload.insert("vertex".to_string(), vertices);

    let w = Writer::new();
    w.write_ply(&mut writer, &mut ply)?;
    Ok(count)
}
