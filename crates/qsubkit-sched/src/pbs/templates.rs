//! PBS batch script template.

use std::path::PathBuf;

use crate::error::{SchedError, SchedResult};

/// Shell profile sourced before the job body runs.
pub const DEFAULT_PROFILE: &str = "$HOME/.bash_profile";

/// Walltime used by a stand-alone template fill.
pub const DEFAULT_FILL_WALLTIME: &str = "0:40:00";

/// Fields substituted into the batch script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptTemplate {
    pub job_name: String,
    pub nodes: u32,
    pub ppn: u32,
    /// Already formatted as `H:MM:SS`.
    pub walltime: String,
    /// Option block, newline separated. May be empty.
    pub options: String,
    pub work_dir: PathBuf,
    pub profile: String,
    /// Command body, newline separated, in execution order.
    pub body: String,
}

impl Default for ScriptTemplate {
    fn default() -> Self {
        Self {
            job_name: "untitled".to_string(),
            nodes: 1,
            ppn: 1,
            walltime: DEFAULT_FILL_WALLTIME.to_string(),
            options: String::new(),
            work_dir: dirs::home_dir().unwrap_or_default(),
            profile: DEFAULT_PROFILE.to_string(),
            body: String::new(),
        }
    }
}

impl ScriptTemplate {
    /// Check that every required field is present.
    fn validate(&self) -> SchedResult<()> {
        let mut missing = Vec::new();
        if self.job_name.trim().is_empty() {
            missing.push("job name");
        }
        if self.nodes == 0 {
            missing.push("node count");
        }
        if self.ppn == 0 {
            missing.push("ppn");
        }
        if self.walltime.trim().is_empty() {
            missing.push("walltime");
        }
        if self.body.trim().is_empty() {
            missing.push("command body");
        }
        if self.work_dir.as_os_str().is_empty() {
            missing.push("working directory");
        }
        if !missing.is_empty() {
            return Err(SchedError::TemplateRender(format!(
                "missing required field(s): {}",
                missing.join(", ")
            )));
        }

        for (field, value) in [
            ("job name", self.job_name.as_str()),
            ("walltime", self.walltime.as_str()),
            ("profile", self.profile.as_str()),
        ] {
            if value.contains('\n') {
                return Err(SchedError::TemplateRender(format!(
                    "{field} must be a single line"
                )));
            }
        }
        Ok(())
    }

    /// Render the complete script document.
    pub fn render(&self) -> SchedResult<String> {
        self.validate()?;

        let mut script = String::new();

        // Resource request
        script.push_str(&format!("#PBS -N {}\n", self.job_name));
        script.push_str(&format!("#PBS -l nodes={}:ppn={}\n", self.nodes, self.ppn));
        script.push_str("#PBS -j oe\n");
        script.push_str("#PBS -S /bin/bash\n");
        script.push_str(&format!("#PBS -l walltime={}\n", self.walltime));

        for line in self.options.lines().filter(|l| !l.trim().is_empty()) {
            script.push_str(line);
            script.push('\n');
        }

        // Environment
        script.push_str("set -x\n");
        script.push_str(&format!("cd {}\n", self.work_dir.display()));
        if !self.profile.trim().is_empty() {
            script.push_str(&format!("source {}\n", self.profile));
        }

        for line in self.body.lines() {
            script.push_str(line);
            script.push('\n');
        }

        Ok(script)
    }
}

/// Render a stand-alone script from template fields.
pub fn fill_template(template: &ScriptTemplate) -> SchedResult<String> {
    template.render()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> ScriptTemplate {
        ScriptTemplate {
            job_name: "hellworld".to_string(),
            work_dir: PathBuf::from("/home/alice"),
            body: "time echo hello".to_string(),
            walltime: "1:00:00".to_string(),
            ..ScriptTemplate::default()
        }
    }

    #[test]
    fn test_render_layout() {
        let script = template().render().unwrap();
        assert_eq!(
            script,
            "#PBS -N hellworld\n\
             #PBS -l nodes=1:ppn=1\n\
             #PBS -j oe\n\
             #PBS -S /bin/bash\n\
             #PBS -l walltime=1:00:00\n\
             set -x\n\
             cd /home/alice\n\
             source $HOME/.bash_profile\n\
             time echo hello\n"
        );
    }

    #[test]
    fn test_render_with_options() {
        let mut t = template();
        t.options = "#PBS -m ea\n#PBS -o /tmp/out".to_string();
        t.nodes = 4;
        t.ppn = 12;
        let script = t.render().unwrap();
        assert!(script.contains("#PBS -l nodes=4:ppn=12\n"));
        assert!(script.contains("#PBS -l walltime=1:00:00\n#PBS -m ea\n#PBS -o /tmp/out\nset -x\n"));
    }

    #[test]
    fn test_render_requires_body() {
        let mut t = template();
        t.body = String::new();
        let err = t.render().unwrap_err();
        assert!(matches!(err, SchedError::TemplateRender(ref m) if m.contains("command body")));
    }

    #[test]
    fn test_render_reports_all_missing_fields() {
        let t = ScriptTemplate {
            job_name: " ".to_string(),
            nodes: 0,
            walltime: String::new(),
            work_dir: PathBuf::new(),
            ..template()
        };
        let SchedError::TemplateRender(msg) = t.render().unwrap_err() else {
            panic!("expected a template render error");
        };
        for field in ["job name", "node count", "walltime", "working directory"] {
            assert!(msg.contains(field), "{msg} should mention {field}");
        }
    }

    #[test]
    fn test_render_rejects_multiline_name() {
        let mut t = template();
        t.job_name = "a\nb".to_string();
        assert!(t.render().is_err());
    }

    #[test]
    fn test_fill_template_defaults() {
        let t = ScriptTemplate {
            body: "echo 'hello'".to_string(),
            work_dir: PathBuf::from("/scratch"),
            ..ScriptTemplate::default()
        };
        let script = fill_template(&t).unwrap();
        assert!(script.starts_with("#PBS -N untitled\n"));
        assert!(script.contains("#PBS -l walltime=0:40:00\n"));
        assert!(script.ends_with("echo 'hello'\n"));
    }
}
