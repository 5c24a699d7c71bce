//! Project initialization command

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

/// Initialize a new project
#[derive(Args, Debug)]
pub struct InitCommand {
    /// Project name / directory
    #[arg(default_value = ".")]
    pub name: String,

    /// Dev server port
    #[arg(short, long, default_value = "9960")]
    pub port: u16,

    /// Overwrite an existing loadplan.toml
    #[arg(long)]
    pub force: bool,
}

impl InitCommand {
    pub async fn execute(&self) -> Result<()> {
        let project_dir = Path::new(&self.name);
        let config_path = project_dir.join("loadplan.toml");

        if config_path.exists() && !self.force {
            anyhow::bail!(
                "{} already exists (use --force to overwrite)",
                config_path.display()
            );
        }

        eprintln!("{} Initializing new project...\n", "→".blue());

        // Create project directory if needed
        if self.name != "." {
            fs::create_dir_all(project_dir)
                .context("Failed to create project directory")?;
        }

        fs::write(&config_path, self.generate_config())
            .context("Failed to write loadplan.toml")?;
        eprintln!("  {} Created {}", "✓".green(), "loadplan.toml".cyan());

        self.generate_sources(project_dir)?;

        eprintln!(
            "\n{} Project initialized successfully!\n",
            "✓".green().bold()
        );

        eprintln!("  Next steps:");
        if self.name != "." {
            eprintln!("    {} cd {}", "→".dimmed(), self.name.cyan());
        }
        eprintln!("    {} loadplan check", "→".dimmed());
        eprintln!("    {} loadplan build --mode development", "→".dimmed());
        eprintln!();

        Ok(())
    }

    fn generate_config(&self) -> String {
        format!(
r#"# Loadplan Configuration
#
# Chains are written in loader order: the last step listed runs first.

entry = "src/index.js"

[project]
name = "{name}"
version = "0.1.0"

[output]
dir = "build"
filename = "js/built.js"
stylesheet = "css/built.css"
images = "imgs"
assets = "assets"

[dev]
port = {port}
compress = true
open = true

[html]
template = "src/index.html"

[targets]
chrome = "60"
firefox = "50"
safari = "10"
edge = "17"

[[rules]]
name = "styles"
test = "*.css"
use = ["mini-css-extract", "css-loader", "postcss-loader"]

[[rules]]
name = "less"
test = "*.less"
use = ["mini-css-extract", "css-loader", "less-loader"]

[[rules]]
name = "scripts"
test = "*.js"
exclude = {{ regex = "node_modules" }}
use = ["babel-loader"]

[[rules]]
name = "images"
test = {{ regex = '\.(jpg|png|gif)$' }}
use = [{{ name = "url-loader", options = {{ limit = 8192, name = "[hash:10].[ext]", output_path = "imgs" }} }}]

[[rules]]
name = "html"
test = "*.html"
use = ["html-loader"]

[[rules]]
name = "other"
fallback = true
exclude = {{ regex = '\.(css|less|js|jpg|png|gif|html)$' }}
use = [{{ name = "file-loader", options = {{ name = "[hash:10].[ext]", output_path = "assets" }} }}]
"#,
            name = if self.name == "." { "my-app" } else { self.name.as_str() },
            port = self.port,
        )
    }

    fn generate_sources(&self, project_dir: &Path) -> Result<()> {
        let src_dir = project_dir.join("src");
        fs::create_dir_all(&src_dir)?;

        let files: [(&str, &str); 4] = [
            ("index.js", "import './index.css';\nimport './theme.less';\n\nconsole.log('ready');\n"),
            ("index.css", "body {\n  margin: 0;\n  display: flex;\n}\n"),
            ("theme.less", "@accent: #646cff;\n\nh1 {\n  color: @accent;\n}\n"),
            (
                "index.html",
                "<!DOCTYPE html>\n<html lang=\"en\">\n  <head>\n    <meta charset=\"UTF-8\" />\n    <title>App</title>\n  </head>\n  <body>\n    <h1>Hello</h1>\n  </body>\n</html>\n",
            ),
        ];

        for (name, content) in files {
            let path = src_dir.join(name);
            if path.exists() {
                continue;
            }
            fs::write(&path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("  {} Created {}", "✓".green(), format!("src/{}", name).cyan());
        }

        Ok(())
    }
}
