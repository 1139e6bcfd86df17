use anyhow::anyhow;
use reqwest::Url;

use super::types::*;
use crate::api::Coord;

#[derive(Clone)]
pub struct Client {
    inner: reqwest::Client,
    base: Url,
    api_key: String,
}

impl Client {
    pub fn new(base: &str, api_key: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::new();
        let base = base
            .parse()
            .map_err(|e| anyhow!("{} is not a valid url: {}", base, e))?;

        Ok(Self {
            inner: client,
            base,
            api_key: api_key.into(),
        })
    }

    fn url(&self, path: &str) -> anyhow::Result<Url> {
        self.base
            .join(path)
            .map_err(|e| anyhow!("error joining url: {e}"))
    }

    /// Driving route between two points.
    pub async fn route(&self, from: Coord, to: Coord) -> anyhow::Result<Route> {
        let url = self.url("/v1/routing")?;
        let waypoints = format!("{},{}|{},{}", from.lat, from.lng, to.lat, to.lng);

        let response: FeatureCollection<RouteFeature> = self
            .inner
            .get(url)
            .query(&[
                ("waypoints", waypoints.as_str()),
                ("mode", "drive"),
                ("apiKey", self.api_key.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response
            .features
            .into_iter()
            .next()
            .map(Route::from_feature)
            .ok_or_else(|| anyhow!("routing service returned no route"))
    }

    /// Autocomplete candidates for `text` inside `area`, best match first.
    pub async fn search(&self, text: &str, area: &SearchArea) -> anyhow::Result<Vec<Place>> {
        let url = self.url("/v1/geocode/autocomplete")?;

        let response: FeatureCollection<PlaceFeature> = self
            .inner
            .get(url)
            .query(&[
                ("text", text),
                ("type", area.place_type.as_str()),
                ("filter", area.filter().as_str()),
                ("bias", area.bias().as_str()),
                ("apiKey", self.api_key.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response
            .features
            .into_iter()
            .map(|feature| Place::from(feature.properties))
            .collect())
    }
}
