use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default = "default_days")]
    pub days: u32,
}

fn default_days() -> u32 {
    7
}
