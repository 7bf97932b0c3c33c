use crate::session::DisplayTool;

/// Builds display-tool argument vectors that enable one output and turn
/// another off.
#[derive(Debug, Clone, Copy)]
pub struct CommandBuilder {
    tool: DisplayTool,
}

impl CommandBuilder {
    pub fn new(tool: DisplayTool) -> Self {
        Self { tool }
    }

    pub fn build_screen_command(&self, enable_output: &str, disable_output: &str) -> Vec<String> {
        let mut cmd = vec![self.tool.command().to_string()];

        match self.tool {
            DisplayTool::Xrandr | DisplayTool::GnomeRandr => {
                cmd.extend(["--output", enable_output, "--auto"].map(String::from));
                cmd.extend(["--output", disable_output, "--off"].map(String::from));
            }
            DisplayTool::KscreenDoctor => {
                cmd.push(format!("output.{}.enable", enable_output));
                cmd.push(format!("output.{}.disable", disable_output));
            }
        }
        cmd
    }
}
