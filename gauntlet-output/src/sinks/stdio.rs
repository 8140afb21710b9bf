//! Standard stream sink for the console summary

use async_trait::async_trait;
use std::time::Instant;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};

use crate::{
    artifact::{Artifact, DeliveryResult},
    errors::DeliveryError,
    sinks::ArtifactSink,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StdStream {
    #[default]
    Stdout,
    Stderr,
}

impl StdStream {
    pub fn as_str(&self) -> &'static str {
        match self {
            StdStream::Stdout => "stdout",
            StdStream::Stderr => "stderr",
        }
    }
}

#[derive(Debug, Default)]
pub struct StdioSink {
    stream: StdStream,
}

impl StdioSink {
    pub fn new(stream: StdStream) -> Self {
        Self { stream }
    }

    pub fn stream(&self) -> StdStream {
        self.stream
    }

    async fn write_to<W>(&self, writer: W, data: &[u8]) -> Result<(), DeliveryError>
    where
        W: AsyncWrite + Unpin,
    {
        let stream = self.stream.as_str();
        let map_err = |e: std::io::Error| DeliveryError::Stdio {
            stream: stream.to_string(),
            error: e.to_string(),
        };

        let mut writer = BufWriter::new(writer);
        writer.write_all(data).await.map_err(map_err)?;
        if !data.ends_with(b"\n") {
            writer.write_all(b"\n").await.map_err(map_err)?;
        }
        writer.flush().await.map_err(map_err)
    }
}

#[async_trait]
impl ArtifactSink for StdioSink {
    async fn deliver(&self, artifact: &Artifact) -> Result<DeliveryResult, DeliveryError> {
        let start_time = Instant::now();
        let data = artifact.content.as_bytes();

        match self.stream {
            StdStream::Stdout => self.write_to(tokio::io::stdout(), data).await?,
            StdStream::Stderr => self.write_to(tokio::io::stderr(), data).await?,
        }

        Ok(DeliveryResult {
            artifact: artifact.name.clone(),
            sink: self.sink_type(),
            location: self.stream.as_str().to_string(),
            size_bytes: artifact.size_bytes(),
            delivery_time: start_time.elapsed(),
        })
    }

    fn sink_type(&self) -> &'static str {
        "stdio"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gauntlet_config::ReportFormat;

    #[tokio::test]
    async fn test_write_appends_trailing_newline() {
        let sink = StdioSink::new(StdStream::Stdout);
        let mut buf: Vec<u8> = Vec::new();

        sink.write_to(&mut buf, b"summary").await.unwrap();
        assert_eq!(buf, b"summary\n");

        let mut buf: Vec<u8> = Vec::new();
        sink.write_to(&mut buf, b"summary\n").await.unwrap();
        assert_eq!(buf, b"summary\n");
    }

    #[tokio::test]
    async fn test_deliver_to_stderr() {
        let sink = StdioSink::new(StdStream::Stderr);
        let artifact = Artifact::new("stdout", ReportFormat::Text, "console summary");

        let result = sink.deliver(&artifact).await.unwrap();
        assert_eq!(result.location, "stderr");
        assert_eq!(result.sink, "stdio");
        assert_eq!(result.size_bytes, 15);
    }
}
