use anyhow::Result;
use url::Url;

use crate::domain::post::{Coordinates, MapMarker, Post};

pub const EARTH_RADIUS_MILES: f64 = 3958.8;

const APPLE_MAPS_BASE: &str = "http://maps.apple.com/";

/// Great-circle distance in miles (haversine). Inputs are not range-checked.
pub fn distance_miles(from: Coordinates, to: Coordinates) -> f64 {
    let d_lat = (to.latitude - from.latitude).to_radians();
    let d_lon = (to.longitude - from.longitude).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + from.latitude.to_radians().cos()
            * to.latitude.to_radians().cos()
            * (d_lon / 2.0).sin().powi(2);
    // Rounding can push `a` just past 1 for antipodal points.
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_MILES * c
}

/// Distance from the viewer to a spot, when the spot has coordinates.
pub fn distance_to_post(viewer: Coordinates, post: &Post) -> Option<f64> {
    post.coordinates().map(|spot| distance_miles(viewer, spot))
}

/// Driving directions link. Without a known start the maps app uses the
/// device location.
pub fn directions_url(from: Option<Coordinates>, to: Coordinates) -> Result<Url> {
    let mut url = Url::parse(APPLE_MAPS_BASE)?;
    {
        let mut query = url.query_pairs_mut();
        if let Some(from) = from {
            query.append_pair("saddr", &format!("{},{}", from.latitude, from.longitude));
        }
        query.append_pair("daddr", &format!("{},{}", to.latitude, to.longitude));
        query.append_pair("dirflg", "d");
    }
    Ok(url)
}

/// Markers for every post that can be placed on a map, in input order.
pub fn map_markers(posts: &[Post]) -> Vec<MapMarker> {
    posts.iter().filter_map(MapMarker::from_post).collect()
}
