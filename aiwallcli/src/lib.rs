pub use crate::app::{build_applier, AiwallCliApp, StdoutNotifier};

mod app {
    use aiwall_core::*;
    use anyhow::{Context, Result};
    use std::io::{self, Write};
    use std::sync::Arc;

    pub const DEFAULT_QUERY: &str = "Futuristic Car";

    /// Prints notifications where the user is looking
    pub struct StdoutNotifier;

    impl Notifier for StdoutNotifier {
        fn notify(&self, notification: &Notification) {
            match notification.kind {
                NotificationKind::Success => println!("{}", notification.message),
                NotificationKind::Failure => eprintln!("{}", notification.message),
            }
        }
    }

    /// Applier wired to the desktop adapters
    pub fn build_applier(config: &Config) -> WallpaperApplier {
        WallpaperApplier::new(
            Arc::new(HttpImageFetcher),
            Arc::new(DesktopWallpaperSetter::from_config(config)),
            Arc::new(FixedScreenMetrics::from_config(config)),
        )
    }

    pub struct AiwallCliApp {
        config: Config,
        client: ImageSearchClient,
        applier: WallpaperApplier,
        notifier: Arc<dyn Notifier>,
        results: Vec<ImageResult>,
        last_query: String,
        scaling: ScalingMode,
        target: TargetSurface,
    }

    impl AiwallCliApp {
        pub fn with_config(config: Config) -> Result<Self> {
            let client = ImageSearchClient::new(config.search_config()?);
            let applier = build_applier(&config);

            Ok(Self {
                config,
                client,
                applier,
                notifier: Arc::new(StdoutNotifier),
                results: Vec::new(),
                last_query: DEFAULT_QUERY.to_string(),
                scaling: ScalingMode::default(),
                target: TargetSurface::default(),
            })
        }

        /// Search sized for the configured screen and keep the results for selection
        pub async fn search(&mut self, query: &str) -> &[ImageResult] {
            let query = SearchQuery::new(query, self.config.screen_height, self.config.screen_width);
            self.last_query = query.text.clone();
            self.results = match self.client.search(&query).await {
                SearchOutcome::Ok(results) => results,
                // Already logged by the client
                SearchOutcome::Failed(_) => Vec::new(),
            };
            &self.results
        }

        pub async fn apply_url(&self, url: &str, scaling: ScalingMode, target: TargetSurface) -> ApplyOutcome {
            let request = ApplyRequest::new(url, scaling, target);
            let handle = self.applier.spawn_apply(request, Arc::clone(&self.notifier));
            match handle.await {
                Ok(outcome) => outcome,
                Err(e) => ApplyOutcome::Failed(ApplyError::Task(e.to_string())),
            }
        }

        pub async fn apply_result(&self, number: usize) -> Result<ApplyOutcome> {
            let url = number
                .checked_sub(1)
                .and_then(|index| self.results.get(index))
                .with_context(|| format!("No image #{} in the current results", number))?
                .url()
                .to_string();
            Ok(self.apply_url(&url, self.scaling, self.target).await)
        }

        fn show_results(&self) {
            if self.results.is_empty() {
                println!("No images found for \"{}\".", self.last_query);
                return;
            }
            println!("\nResults for \"{}\":", self.last_query);
            for (i, result) in self.results.iter().enumerate() {
                println!("{:>3}. {}", i + 1, result);
            }
        }

        fn show_menu(&self) {
            println!("\n=== aiwall - Unsplash Wallpapers ===");
            println!("Query: \"{}\" | {} images", self.last_query, self.results.len());
            println!("Scaling: {} | Target: {}", self.scaling, self.target);
            println!();
            println!("1. New search");
            println!("2. Show results");
            println!("3. Set wallpaper");
            println!("4. Change scaling (crop, fit, stretch)");
            println!("5. Change target (home, lock, both)");
            println!("6. Exit");
            print!("\nSelect an option (1-6): ");
            let _ = io::stdout().flush();
        }

        fn prompt(&self, label: &str) -> Result<String> {
            print!("{}: ", label);
            io::stdout().flush()?;
            let mut input = String::new();
            io::stdin().read_line(&mut input)?;
            Ok(input.trim().to_string())
        }

        pub async fn run(&mut self, initial_query: Option<String>) -> Result<()> {
            let query = initial_query.unwrap_or_else(|| DEFAULT_QUERY.to_string());
            self.search(&query).await;
            self.show_results();

            loop {
                self.show_menu();

                let mut input = String::new();
                if io::stdin().read_line(&mut input)? == 0 {
                    break;
                }

                match input.trim() {
                    "1" => {
                        let query = self.prompt("Search")?;
                        self.search(&query).await;
                        self.show_results();
                    }
                    "2" => self.show_results(),
                    "3" => {
                        let choice = self.prompt("Image number")?;
                        match choice.parse::<usize>() {
                            Ok(number) => {
                                if let Err(e) = self.apply_result(number).await {
                                    eprintln!("{}", e);
                                }
                            }
                            Err(_) => eprintln!("Invalid image number: {}", choice),
                        }
                    }
                    "4" => match self.prompt("Scaling")?.parse::<ScalingMode>() {
                        Ok(scaling) => self.scaling = scaling,
                        Err(e) => eprintln!("{}", e),
                    },
                    "5" => match self.prompt("Target")?.parse::<TargetSurface>() {
                        Ok(target) => self.target = target,
                        Err(e) => eprintln!("{}", e),
                    },
                    "6" => {
                        println!("Exiting aiwall...");
                        break;
                    }
                    _ => {
                        println!("Invalid option. Please select 1-6.");
                    }
                }
            }

            Ok(())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn app() -> AiwallCliApp {
            let dir = std::env::temp_dir().join("aiwallcli-test");
            let config = Config {
                access_key: Some("test-key".to_string()),
                output_dir: Some(dir),
                ..Config::default()
            };
            AiwallCliApp::with_config(config).unwrap()
        }

        #[test]
        fn test_requires_access_key() {
            assert!(AiwallCliApp::with_config(Config::default()).is_err());
        }

        #[tokio::test]
        async fn test_apply_result_out_of_range() {
            let app = app();
            assert!(app.apply_result(0).await.is_err());
            assert!(app.apply_result(1).await.is_err());
        }
    }
}
