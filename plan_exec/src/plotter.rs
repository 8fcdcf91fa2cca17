//! # Plotter
//!
//! Renders a planning situation into an image for debugging. The plotter has no influence on
//! planning, it only draws what it has been given:
//!
//! - the occupancy grid in greyscale, free cells white, occupied black and unknown mid-grey,
//! - the centerline in black,
//! - the candidates, infeasible in red, feasible in blue and the selected candidate in green,
//! - waypoints as orange squares.
//!
//! The world window is the bounding box of everything added, grown by a margin and then widened
//! along one axis so that both axes share the same scale.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use image::{Rgb, RgbImage};
use log::debug;
use nalgebra::Vector2;
use serde::Deserialize;
use std::path::Path;

// Internal
use crate::{
    curve::{Curve, Polynomial},
    map::{OccupancyGrid, OCCUPANCY_UNKNOWN},
    plan::{Candidate, Centerline},
};
use util::maths::lin_map;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const UNKNOWN: Rgb<u8> = Rgb([128, 128, 128]);
const PATH: Rgb<u8> = Rgb([0, 0, 0]);
const WAYPOINT: Rgb<u8> = Rgb([255, 140, 0]);
const INFEASIBLE: Rgb<u8> = Rgb([220, 30, 30]);
const FEASIBLE: Rgb<u8> = Rgb([30, 30, 220]);
const SELECTED: Rgb<u8> = Rgb([0, 180, 0]);

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct PlotterParams {
    /// Margin added around the bounding box of the plotted items
    pub margin_m: f64,

    /// Arc length step used to sample candidates
    pub sample_step_m: f64,

    /// Side length of the waypoint markers
    pub waypoint_size_px: u32,
}

pub struct Plotter<C: Curve = Polynomial> {
    params: PlotterParams,
    path: Option<Centerline>,
    curves: Vec<Candidate<C>>,
    map: Option<OccupancyGrid>,
    waypoints: Vec<Vector2<f64>>,
}

/// Transform from the world window to image pixels.
struct Frame {
    min_m: Vector2<f64>,
    max_m: Vector2<f64>,
    size_px: (u32, u32),
}

#[derive(Debug, thiserror::Error)]
pub enum PlotError {
    #[error("Nothing has been added to the plot")]
    NothingToPlot,

    #[error("Image dimensions must be non-zero, got {0}x{1}")]
    InvalidSize(u32, u32),

    #[error("Could not save the plot: {0}")]
    SaveError(image::ImageError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for PlotterParams {
    fn default() -> Self {
        Self {
            margin_m: 2.0,
            sample_step_m: 0.1,
            waypoint_size_px: 5,
        }
    }
}

impl<C: Curve> Plotter<C> {
    pub fn new(params: PlotterParams) -> Self {
        Self {
            params,
            path: None,
            curves: Vec::new(),
            map: None,
            waypoints: Vec::new(),
        }
    }

    /// Set the centerline. Candidates can only be drawn once a centerline is set.
    pub fn set_path(&mut self, path: &Centerline) {
        self.path = Some(path.clone());
    }

    pub fn add_curves(&mut self, curves: Vec<Candidate<C>>) {
        self.curves.extend(curves);
    }

    /// Set the occupancy grid, replacing any previous one.
    pub fn add_map(&mut self, map: OccupancyGrid) {
        self.map = Some(map);
    }

    pub fn add_waypoints(&mut self, waypoints: Vec<Vector2<f64>>) {
        self.waypoints.extend(waypoints);
    }

    /// The world window that will be plotted as `(min, max)` corners, before aspect correction.
    ///
    /// `None` if nothing has been added.
    pub fn dimensions(&self) -> Option<(Vector2<f64>, Vector2<f64>)> {
        let mut points = self.waypoints.clone();

        if let Some(ref map) = self.map {
            points.push(map.origin_m());
            points.push(map.extent_m());
        }

        if let Some(ref path) = self.path {
            points.extend_from_slice(path.points_m());
            for curve in &self.curves {
                points.extend(self.curve_points(path, curve));
            }
        }

        let first = *points.first()?;
        let (min, max) = points.iter().fold((first, first), |(min, max), p| {
            (min.inf(p), max.sup(p))
        });

        let margin = Vector2::repeat(self.params.margin_m.max(0.0));
        Some((min - margin, max + margin))
    }

    /// Render the plot into an image of `nx` by `ny` pixels.
    pub fn render(&self, nx: u32, ny: u32) -> Result<RgbImage, PlotError> {
        if nx == 0 || ny == 0 {
            return Err(PlotError::InvalidSize(nx, ny));
        }

        let (min_m, max_m) = self.dimensions().ok_or(PlotError::NothingToPlot)?;
        let frame = Frame::new(min_m, max_m, (nx, ny));

        let mut img = RgbImage::from_pixel(nx, ny, BACKGROUND);

        if let Some(ref map) = self.map {
            draw_map(&mut img, &frame, map);
        }

        if let Some(ref path) = self.path {
            draw_polyline(&mut img, &frame, path.points_m(), PATH);

            // Draw in order of importance so the selected candidate ends up on top
            let mut order: Vec<&Candidate<C>> = self.curves.iter().collect();
            order.sort_by_key(|c| layer(*c));

            for curve in order {
                let points: Vec<_> = self.curve_points(path, curve).collect();
                draw_polyline(&mut img, &frame, &points, colour(curve));
            }
        } else if !self.curves.is_empty() {
            debug!("Plotter: no centerline set, {} candidates not drawn", self.curves.len());
        }

        for wp in &self.waypoints {
            draw_square(&mut img, &frame, wp, self.params.waypoint_size_px, WAYPOINT);
        }

        Ok(img)
    }

    /// Render the plot and save it to the given path, the format is taken from the extension.
    pub fn save<P: AsRef<Path>>(&self, path: P, nx: u32, ny: u32) -> Result<(), PlotError> {
        self.render(nx, ny)?
            .save(path)
            .map_err(PlotError::SaveError)
    }

    /// Cartesian points along a candidate.
    fn curve_points<'a>(
        &self,
        path: &'a Centerline,
        curve: &'a Candidate<C>,
    ) -> impl Iterator<Item = Vector2<f64>> + 'a {
        curve
            .sample_points(self.params.sample_step_m)
            .into_iter()
            .map(move |s| path.point_at(curve.s0 + s, curve.at(s)))
    }
}

impl Frame {
    fn new(min_m: Vector2<f64>, max_m: Vector2<f64>, size_px: (u32, u32)) -> Self {
        let mut min_m = min_m;
        let mut max_m = max_m;

        // Widen the short axis so pixels are square
        let size = (max_m - min_m).map(|v| v.max(f64::EPSILON));
        let px = Vector2::new(size_px.0 as f64, size_px.1 as f64);
        let scale = (size.x / px.x).max(size.y / px.y);
        let pad = (px * scale - size) / 2.0;
        min_m -= pad;
        max_m += pad;

        Self {
            min_m,
            max_m,
            size_px,
        }
    }

    /// Pixel containing the position, or `None` if it's outside the image.
    fn to_pixel(&self, position_m: &Vector2<f64>) -> Option<(u32, u32)> {
        let x = lin_map(
            (self.min_m.x, self.max_m.x),
            (0.0, self.size_px.0 as f64),
            position_m.x,
        );
        // Image rows run downwards
        let y = lin_map(
            (self.min_m.y, self.max_m.y),
            (self.size_px.1 as f64, 0.0),
            position_m.y,
        );

        if x >= 0.0 && y >= 0.0 && x < self.size_px.0 as f64 && y < self.size_px.1 as f64 {
            Some((x as u32, y as u32))
        } else {
            None
        }
    }

    /// World position of the centre of a pixel.
    fn to_world(&self, pixel: (u32, u32)) -> Vector2<f64> {
        Vector2::new(
            lin_map(
                (0.0, self.size_px.0 as f64),
                (self.min_m.x, self.max_m.x),
                pixel.0 as f64 + 0.5,
            ),
            lin_map(
                (self.size_px.1 as f64, 0.0),
                (self.min_m.y, self.max_m.y),
                pixel.1 as f64 + 0.5,
            ),
        )
    }

    /// Size of a pixel in meters.
    fn pixel_size_m(&self) -> f64 {
        (self.max_m.x - self.min_m.x) / self.size_px.0 as f64
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn layer<C: Curve>(curve: &Candidate<C>) -> u8 {
    match (curve.is_feasible(), curve.rank) {
        (false, _) => 0,
        (true, Some(0)) => 2,
        (true, _) => 1,
    }
}

fn colour<C: Curve>(curve: &Candidate<C>) -> Rgb<u8> {
    match layer(curve) {
        0 => INFEASIBLE,
        1 => FEASIBLE,
        _ => SELECTED,
    }
}

fn draw_map(img: &mut RgbImage, frame: &Frame, map: &OccupancyGrid) {
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let value = match map.get_position(&frame.to_world((x, y))) {
            Some(&v) => v,
            None => continue,
        };

        *pixel = if value == OCCUPANCY_UNKNOWN {
            UNKNOWN
        } else {
            let grey = lin_map((0.0, 100.0), (255.0, 0.0), value.max(0).min(100) as f64);
            Rgb([grey as u8; 3])
        };
    }
}

/// Draw straight lines between consecutive points, stepping at half a pixel.
fn draw_polyline(img: &mut RgbImage, frame: &Frame, points: &[Vector2<f64>], colour: Rgb<u8>) {
    let step_m = frame.pixel_size_m() / 2.0;

    for pair in points.windows(2) {
        let delta = pair[1] - pair[0];
        let num_steps = (delta.norm() / step_m).ceil().max(1.0) as usize;

        for i in 0..=num_steps {
            let p = pair[0] + delta * (i as f64 / num_steps as f64);
            if let Some((x, y)) = frame.to_pixel(&p) {
                img.put_pixel(x, y, colour);
            }
        }
    }

    if let [single] = points {
        if let Some((x, y)) = frame.to_pixel(single) {
            img.put_pixel(x, y, colour);
        }
    }
}

fn draw_square(
    img: &mut RgbImage,
    frame: &Frame,
    centre_m: &Vector2<f64>,
    size_px: u32,
    colour: Rgb<u8>,
) {
    let (cx, cy) = match frame.to_pixel(centre_m) {
        Some(p) => p,
        None => return,
    };
    let half = size_px / 2;

    for x in cx.saturating_sub(half)..=(cx + half).min(img.width() - 1) {
        for y in cy.saturating_sub(half)..=(cy + half).min(img.height() - 1) {
            img.put_pixel(x, y, colour);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::map::OCCUPANCY_FREE;

    fn centerline() -> Centerline {
        Centerline::new(vec![Vector2::new(0.0, 0.0), Vector2::new(10.0, 0.0)]).unwrap()
    }

    fn candidate(rho: f64, rank: usize, feasible: bool) -> Candidate {
        let mut c = Candidate::new(Polynomial::constant(rho));
        c.max_length = 8.0;
        c.s0 = 1.0;
        c.rank = Some(rank);
        c.hits_obstacle = !feasible;
        c
    }

    fn count(img: &RgbImage, colour: Rgb<u8>) -> usize {
        img.pixels().filter(|&&p| p == colour).count()
    }

    #[test]
    fn test_empty_plot() {
        let plotter: Plotter = Plotter::new(PlotterParams::default());

        assert!(plotter.dimensions().is_none());
        assert!(matches!(plotter.render(10, 10), Err(PlotError::NothingToPlot)));
    }

    #[test]
    fn test_dimensions() {
        let mut plotter: Plotter = Plotter::new(PlotterParams {
            margin_m: 1.0,
            ..Default::default()
        });
        plotter.set_path(&centerline());
        plotter.add_waypoints(vec![Vector2::new(5.0, 3.0)]);

        let (min, max) = plotter.dimensions().unwrap();
        assert_eq!(min, Vector2::new(-1.0, -1.0));
        assert_eq!(max, Vector2::new(11.0, 4.0));

        assert!(matches!(plotter.render(0, 10), Err(PlotError::InvalidSize(0, 10))));
    }

    #[test]
    fn test_render_colours() {
        let mut map =
            OccupancyGrid::new(0.5, (24, 12), Vector2::new(-1.0, -3.0), OCCUPANCY_UNKNOWN).unwrap();
        map.fill_where(OCCUPANCY_FREE, |p| p.y > 0.0);

        let mut plotter = Plotter::new(PlotterParams::default());
        plotter.add_map(map);
        plotter.set_path(&centerline());
        plotter.add_curves(vec![
            candidate(1.5, 0, true),
            candidate(-1.5, 1, true),
            candidate(2.5, 2, false),
        ]);
        plotter.add_waypoints(vec![Vector2::new(10.0, 0.0)]);

        let img = plotter.render(200, 100).unwrap();
        assert_eq!(img.dimensions(), (200, 100));

        for colour in &[UNKNOWN, PATH, WAYPOINT, INFEASIBLE, FEASIBLE, SELECTED] {
            assert!(count(&img, *colour) > 0, "Missing colour {:?}", colour);
        }
    }

    #[test]
    fn test_candidates_need_path() {
        let mut plotter = Plotter::new(PlotterParams::default());
        plotter.add_curves(vec![candidate(1.0, 0, true)]);
        plotter.add_waypoints(vec![Vector2::new(0.0, 0.0), Vector2::new(4.0, 4.0)]);

        let img = plotter.render(50, 50).unwrap();
        assert_eq!(count(&img, SELECTED), 0);
        assert!(count(&img, WAYPOINT) > 0);
    }

    #[test]
    fn test_save() {
        let mut plotter: Plotter = Plotter::new(PlotterParams::default());
        plotter.set_path(&centerline());

        let path = std::env::temp_dir().join("plan_exec_test_plot.png");
        plotter.save(&path, 64, 32).unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (64, 32));
        std::fs::remove_file(path).ok();
    }
}
