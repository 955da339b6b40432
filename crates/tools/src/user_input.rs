//! User input tool — lets the model ask the person at the terminal a question.
//!
//! The prompt is written to the output stream followed by `": "`, then one
//! line is read back. Both go through a [`Console`], which a front-end that
//! reads the same terminal must share so neither side buffers lines the
//! other needs.

use agentflow_core::error::ToolError;
use agentflow_core::tool::{Parameter, ParameterType, Tool, ToolMetadata};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;

type Reader = Box<dyn AsyncBufRead + Send + Unpin>;
type Writer = Box<dyn AsyncWrite + Send + Unpin>;

/// One line-oriented input stream and its output stream.
pub struct Console {
    io: Mutex<(Reader, Writer)>,
}

impl Console {
    /// Stdin (buffered once, here) and stdout.
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }

    pub fn new<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncBufRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            io: Mutex::new((Box::new(reader), Box::new(writer))),
        }
    }

    /// Write `prompt` (no newline added), then read one line without its terminator.
    ///
    /// `None` at end of input.
    pub async fn ask(&self, prompt: &str) -> std::io::Result<Option<String>> {
        let mut io = self.io.lock().await;
        let (reader, writer) = &mut *io;

        writer.write_all(prompt.as_bytes()).await?;
        writer.flush().await?;

        let mut line = String::new();
        if reader.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

pub struct UserInputTool {
    console: Arc<Console>,
}

impl UserInputTool {
    /// Ask on stdin/stdout through a console of its own.
    pub fn new() -> Self {
        Self::with_console(Arc::new(Console::stdio()))
    }

    pub fn with_console(console: Arc<Console>) -> Self {
        Self { console }
    }

    pub fn with_io<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncBufRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self::with_console(Arc::new(Console::new(reader, writer)))
    }
}

impl Default for UserInputTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for UserInputTool {
    fn name(&self) -> &str {
        "get_user_input"
    }

    fn description(&self) -> &str {
        "Get user input to gain clarity and eliminate ambiguity."
    }

    fn parameters(&self) -> Vec<Parameter> {
        vec![Parameter::new(
            "user_prompt",
            ParameterType::String,
            "The information needed from the user.",
        )]
    }

    fn metadata(&self) -> ToolMetadata {
        ToolMetadata {
            category: "Interaction".into(),
            ..ToolMetadata::default()
        }
    }

    async fn invoke(&self, arguments: Map<String, Value>) -> Result<Value, ToolError> {
        let prompt = arguments
            .get("user_prompt")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArguments("missing 'user_prompt'".into()))?;

        // The console lock keeps parallel questions from interleaving
        match self.console.ask(&format!("{prompt}: ")).await {
            Ok(Some(answer)) => Ok(Value::String(answer)),
            Ok(None) => Err(ToolError::Failed("no input available (end of stream)".into())),
            Err(e) => Err(ToolError::Failed(format!("cannot talk to the user: {e}"))),
        }
    }
}
