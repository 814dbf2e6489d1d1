pub type Endpoint = str;

pub const LOGIN: &Endpoint = "newTwoLoginAPI.do";
pub const PLANT: &Endpoint = "newTwoPlantAPI.do";

/// Device list query for `plant_id`, first page with a single entry.
pub fn device_list(base_url: &str, plant_id: &str) -> String {
    format!(
        "{}?op=getAllDeviceList&plantId={}&pageNum=1&pageSize=1",
        url(base_url, PLANT),
        plant_id
    )
}

pub fn url(base_url: &str, endpoint: &Endpoint) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), endpoint)
}
