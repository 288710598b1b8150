use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub small_font_size: f32,
    pub node_text_color: String,
    pub place_color: String,
    pub transition_color: String,
    pub line_color: String,
    pub non_compliant_color: String,
    pub edge_label_color: String,
    pub chart_colors: [String; 3],
    pub chart_track_opacity: f32,
    pub chart_text_color: String,
    pub background: String,
}

impl Theme {
    /// Dark palette of the incident dashboard the view was designed for.
    pub fn dark() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 12.0,
            small_font_size: 8.0,
            node_text_color: "#FFFFFF".to_string(),
            place_color: "#1f77b4".to_string(),
            transition_color: "#ff7f0e".to_string(),
            line_color: "#aaaaaa".to_string(),
            non_compliant_color: "#d62728".to_string(),
            edge_label_color: "#FFFFFF".to_string(),
            chart_colors: [
                "green".to_string(),
                "lime".to_string(),
                "yellow".to_string(),
            ],
            chart_track_opacity: 0.5,
            chart_text_color: "#FFFFFF".to_string(),
            background: "#1b1b1b".to_string(),
        }
    }

    pub fn light() -> Self {
        Self {
            font_family: "\"trebuchet ms\", verdana, arial, sans-serif".to_string(),
            font_size: 12.0,
            small_font_size: 8.0,
            node_text_color: "#1C2430".to_string(),
            place_color: "#ECECFF".to_string(),
            transition_color: "#FFFFDE".to_string(),
            line_color: "#7A8AA6".to_string(),
            non_compliant_color: "#C0392B".to_string(),
            edge_label_color: "#333333".to_string(),
            chart_colors: [
                "#2E8B57".to_string(),
                "#7CB342".to_string(),
                "#F9A825".to_string(),
            ],
            chart_track_opacity: 0.35,
            chart_text_color: "#333333".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "dark" | "default" => Some(Self::dark()),
            "light" => Some(Self::light()),
            _ => None,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}
