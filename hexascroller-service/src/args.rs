//! Command line arguments

use std::path::PathBuf;

use crate::error::{Result, ServiceError};

pub const USAGE: &str = "\
Usage: hexascroller [OPTIONS]

Options:
  --config PATH         Load configuration from PATH instead of the built-in defaults
  --simulate            Use emulated panels instead of serial ports
  --set-id N            Store logical id N on the first panel port and exit
  --get-id              Print the logical id of the first panel port and exit
  --text TEXT [X Y]     Draw TEXT with the panels' own font at (X, Y) and exit
  --image PATH [X]      Step an image down through the panels from column X and exit
  -h, --help            Show this help";

/// Id maintenance on the first panel port, before ids are known
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provision {
    SetId(u8),
    GetId,
}

/// One-shot job run instead of the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    Provision(Provision),
    /// TEXT command to every discovered panel
    Text { text: String, x: i32, y: i32 },
    /// Image stepped vertically through the panel window
    Image { path: PathBuf, x: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Args {
    pub config: Option<PathBuf>,
    pub simulate: bool,
    pub task: Option<Task>,
    pub help: bool,
}

impl Args {
    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut parsed = Args::default();
        let mut args = args.into_iter().map(Into::into).peekable();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => {
                    let path = args.next().ok_or_else(|| missing_value("--config"))?;
                    parsed.config = Some(PathBuf::from(path));
                }
                "--simulate" => parsed.simulate = true,
                "--set-id" => {
                    let value = args.next().ok_or_else(|| missing_value("--set-id"))?;
                    let id = number(&arg, &value)?;
                    parsed.set_task(Task::Provision(Provision::SetId(id)))?;
                }
                "--get-id" => parsed.set_task(Task::Provision(Provision::GetId))?,
                "--text" => {
                    let text = args.next().ok_or_else(|| missing_value("--text"))?;
                    let (mut x, mut y) = (0, 0);
                    if let Some(value) = args.next_if(|a| a.parse::<i32>().is_ok()) {
                        x = number(&arg, &value)?;
                        let value = args.next().ok_or_else(|| missing_value("--text X"))?;
                        y = number(&arg, &value)?;
                    }
                    parsed.set_task(Task::Text { text, x, y })?;
                }
                "--image" => {
                    let path = args.next().ok_or_else(|| missing_value("--image"))?;
                    let mut x = 0;
                    if let Some(value) = args.next_if(|a| a.parse::<usize>().is_ok()) {
                        x = number(&arg, &value)?;
                    }
                    let path = PathBuf::from(path);
                    parsed.set_task(Task::Image { path, x })?;
                }
                "-h" | "--help" => parsed.help = true,
                other => {
                    return Err(ServiceError::Usage(format!("unknown argument {other:?}")));
                }
            }
        }

        Ok(parsed)
    }

    fn set_task(&mut self, task: Task) -> Result<()> {
        if self.task.is_some() {
            return Err(ServiceError::Usage(
                "--set-id, --get-id, --text and --image are mutually exclusive".to_string(),
            ));
        }
        self.task = Some(task);
        Ok(())
    }
}

fn missing_value(flag: &str) -> ServiceError {
    ServiceError::Usage(format!("{flag} requires a value"))
}

fn number<T: std::str::FromStr>(flag: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| ServiceError::Usage(format!("{flag}: {value:?} is out of range")))
}
