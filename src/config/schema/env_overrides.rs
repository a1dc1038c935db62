use super::Config;

impl Config {
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) =
            std::env::var("PARLEY_API_KEY").or_else(|_| std::env::var("OPENAI_API_KEY"))
            && !key.is_empty()
        {
            self.api_key = Some(key);
        }

        if let Ok(url) = std::env::var("PARLEY_API_URL")
            && !url.is_empty()
        {
            self.api_url = url;
        }

        if let Ok(model) = std::env::var("PARLEY_MODEL")
            && !model.is_empty()
        {
            self.session.model = model;
        }

        if let Ok(temp_str) = std::env::var("PARLEY_TEMPERATURE")
            && let Ok(temp) = temp_str.parse::<f64>()
            && (0.0..=1.0).contains(&temp)
        {
            self.session.temperature = temp;
        }

        if let Ok(dir) = std::env::var("PARLEY_HISTORY_DIR")
            && !dir.is_empty()
        {
            self.history.dir = Some(dir);
        }
    }
}
