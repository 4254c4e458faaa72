use thiserror::Error;

/// Error types for a capture-to-GIF run.
///
/// Every variant maps onto one [`ErrorKind`]; the controller stores the
/// display string as the reason of its `Error` state.
#[derive(Error, Debug)]
pub enum RecorderError {
    #[error("Camera device failed: {0}")]
    Device(#[source] camera::CameraError),

    #[error("Capture interrupted: {0}")]
    CaptureInterrupted(String),

    #[error("Encoding failed: {0}")]
    Encode(#[from] gif_encoder::EncoderError),

    #[error("Invalid configuration parameters: {0}")]
    InvalidConfig(String),

    #[error("Image processing failed: {0}")]
    ImageProcessingFailed(String),

    #[error("Run was cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Camera missing or access denied when the run starts.
    Device,
    /// Device lost while recording or sampling, or nothing was recorded.
    CaptureInterrupted,
    Encode,
    Config,
    Cancelled,
}

impl RecorderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RecorderError::Device(_) => ErrorKind::Device,
            RecorderError::CaptureInterrupted(_) | RecorderError::ImageProcessingFailed(_) => {
                ErrorKind::CaptureInterrupted
            }
            RecorderError::Encode(_) => ErrorKind::Encode,
            RecorderError::InvalidConfig(_) => ErrorKind::Config,
            RecorderError::Cancelled => ErrorKind::Cancelled,
        }
    }
}

impl From<fast_image_resize::ImageBufferError> for RecorderError {
    fn from(e: fast_image_resize::ImageBufferError) -> Self {
        RecorderError::ImageProcessingFailed(e.to_string())
    }
}

impl From<fast_image_resize::ResizeError> for RecorderError {
    fn from(e: fast_image_resize::ResizeError) -> Self {
        RecorderError::ImageProcessingFailed(format!("Resize failed: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(
            RecorderError::Device(camera::CameraError::DeviceBusy).kind(),
            ErrorKind::Device
        );
        assert_eq!(
            RecorderError::CaptureInterrupted("unplugged".to_string()).kind(),
            ErrorKind::CaptureInterrupted
        );
        assert_eq!(
            RecorderError::from(gif_encoder::EncoderError::EmptySequence).kind(),
            ErrorKind::Encode
        );
        assert_eq!(RecorderError::Cancelled.kind(), ErrorKind::Cancelled);
    }

    #[test]
    fn test_display_carries_reason() {
        let e = RecorderError::CaptureInterrupted("camera lost".to_string());
        assert_eq!(e.to_string(), "Capture interrupted: camera lost");
    }
}
