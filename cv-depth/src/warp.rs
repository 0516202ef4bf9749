use crate::{DepthMap, MHPack, ReconstructFlags, Result, ScaleParameters};
use cv_core::nalgebra::{Point2, Vector3};
use cv_core::{CameraModel, RigidTransform};
use itertools::izip;
use log::*;

fn is_placeholder(point: &Vector3<f64>) -> bool {
    *point == Vector3::zeros()
}

impl<'a> DepthMap<'a> {
    /// Refines this depth map with the depths of another view.
    ///
    /// `transform` maps points of the `target` camera frame into this map's camera frame (it is
    /// the pose of the target camera seen from this one). Every valid first hypothesis of this map
    /// is moved into the target view, looked up in the nearest target column, and the target's
    /// first hypothesis is moved back and measured along the ray of the source column.
    ///
    /// `output` becomes a copy of this map whose first hypothesis layer is reset to depth `0` and
    /// sigma `1`. Columns that found a valid target hypothesis then get the round-tripped depth
    /// and the target's sigma. The other hypothesis layers are copied unchanged.
    pub fn warp_into<T>(&self, target: &DepthMap<'_>, transform: &T, output: &mut DepthMap<'a>)
    where
        T: RigidTransform + ?Sized,
    {
        let mut source = MHPack::default();
        self.reconstruct(&mut source, ReconstructFlags::default());
        let in_target = transform.inverse_transform_points(&source.cloud);

        // Remember which source entry every query came from.
        let (query_origin, query_points): (Vec<usize>, Vec<Point2<f64>>) =
            izip!(&source.cloud, target.project(&in_target))
                .enumerate()
                .filter(|(_, (point, _))| !is_placeholder(point))
                .filter_map(|(origin, (_, image_point))| image_point.map(|p| (origin, p)))
                .unzip();
        debug!(
            "warping {} source points, {} land in the target view",
            source.len(),
            query_points.len()
        );

        let mut found = MHPack::from_points(query_points);
        let flags = ReconstructFlags::default()
            .query_points()
            .sigma_value()
            .index_mapping();
        target.reconstruct(&mut found, flags);
        let back = transform.transform_points(&found.cloud);

        output.clone_from(self);
        output.reset_layer(0, 0.0, 1.0);
        let mut warped = 0;
        for (point, round_trip, &sigma, &query) in
            izip!(&found.cloud, &back, &found.sigma_vec, &found.idx_map_vec)
        {
            if is_placeholder(point) {
                continue;
            }
            let origin = query_origin[query];
            let ray = source.cloud[origin].normalize();
            let idx = source.idx_vec[origin];
            *output.at_idx_mut(idx) = round_trip.dot(&ray);
            *output.sigma_idx_mut(idx) = sigma;
            warped += 1;
        }
        debug!("{} columns found a target hypothesis", warped);
    }

    /// Moves this depth map into another view.
    ///
    /// The result is a fresh depth map for `camera` with the shape `params`. `transform` maps
    /// points of the new camera frame into this map's camera frame. Every valid first hypothesis
    /// of this map is moved into the new view and stored, with its sigma and cost, as the first
    /// hypothesis of the cell it projects onto. When several hypotheses land on the same cell the
    /// one from the highest source index wins.
    pub fn warp<'b, T>(
        &self,
        camera: &'b dyn CameraModel,
        params: ScaleParameters,
        transform: &T,
    ) -> Result<DepthMap<'b>>
    where
        T: RigidTransform + ?Sized,
    {
        let mut warped = DepthMap::try_new(camera, params)?;

        let mut source = MHPack::default();
        let flags = ReconstructFlags::default().sigma_value().cost_value();
        self.reconstruct(&mut source, flags);
        let in_target = transform.inverse_transform_points(&source.cloud);
        let projected = warped.project(&in_target);

        let mut written = 0;
        for (point, moved, image_point, &sigma, &cost) in izip!(
            &source.cloud,
            &in_target,
            projected,
            &source.sigma_vec,
            &source.cost_vec
        ) {
            if is_placeholder(point) {
                continue;
            }
            let (x, y) = match image_point.and_then(|p| warped.grid_coords(&p)) {
                Some(coords) => coords,
                None => continue,
            };
            let idx = warped.index(x, y, 0);
            *warped.at_idx_mut(idx) = moved.norm();
            *warped.sigma_idx_mut(idx) = sigma;
            *warped.cost_idx_mut(idx) = cost;
            written += 1;
        }
        debug!(
            "warped {} of {} source points into a {}x{} grid",
            written,
            source.len(),
            warped.x_max,
            warped.y_max
        );
        Ok(warped)
    }
}
