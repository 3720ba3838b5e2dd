use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll, ready},
};

use futures::Stream;

use crate::looper::{Sample, SampleProvider};

/// Paces a looper in real time: each sample is yielded immediately and the
/// next one only after the previous sample's duration has elapsed.
///
/// The stream never ends on its own; errors from the looper are yielded and
/// the caller decides whether to keep polling.
pub struct LooperStream<L> {
    looper: L,
    sleep: Option<Pin<Box<tokio::time::Sleep>>>,
}

impl<L: SampleProvider> LooperStream<L> {
    pub fn new(looper: L) -> Self {
        Self {
            looper,
            sleep: None,
        }
    }

    pub fn get_ref(&self) -> &L {
        &self.looper
    }
}

impl<L: SampleProvider + Unpin> Stream for LooperStream<L> {
    type Item = anyhow::Result<Sample>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if let Some(sleep) = this.sleep.as_mut() {
            ready!(sleep.as_mut().poll(cx));
            this.sleep = None;
        }

        let sample = match this.looper.next_sample() {
            Ok(sample) => sample,
            Err(e) => return Poll::Ready(Some(Err(e))),
        };
        if !sample.duration.is_zero() {
            this.sleep = Some(Box::pin(tokio::time::sleep(sample.duration)));
        }
        Poll::Ready(Some(Ok(sample)))
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use bytes::Bytes;
    use futures::StreamExt;

    use super::*;

    struct Counting {
        next: u8,
        duration: Duration,
    }

    impl SampleProvider for Counting {
        fn next_sample(&mut self) -> anyhow::Result<Sample> {
            self.next = self.next.wrapping_add(1);
            Ok(Sample {
                data: Bytes::from(vec![self.next]),
                duration: self.duration,
            })
        }
    }

    struct Failing;

    impl SampleProvider for Failing {
        fn next_sample(&mut self) -> anyhow::Result<Sample> {
            anyhow::bail!("broken clip")
        }
    }

    #[tokio::test]
    async fn test_stream_paces_samples() -> anyhow::Result<()> {
        let mut stream = LooperStream::new(Counting {
            next: 0,
            duration: Duration::from_millis(20),
        });
        let start = Instant::now();
        let mut got = Vec::new();
        for _ in 0..4 {
            let sample = stream.next().await.unwrap()?;
            got.push(sample.data[0]);
        }
        // three waits between four samples
        assert!(start.elapsed() >= Duration::from_millis(60));
        assert_eq!(got, vec![1, 2, 3, 4]);
        assert_eq!(stream.get_ref().next, 4);
        Ok(())
    }

    #[tokio::test]
    async fn test_zero_duration_samples_are_not_delayed() -> anyhow::Result<()> {
        let mut stream = LooperStream::new(Counting {
            next: 0,
            duration: Duration::ZERO,
        });
        let start = Instant::now();
        for _ in 0..100 {
            stream.next().await.unwrap()?;
        }
        assert!(start.elapsed() < Duration::from_secs(1));
        Ok(())
    }

    #[tokio::test]
    async fn test_errors_are_yielded() {
        let mut stream = LooperStream::new(Box::new(Failing) as Box<dyn SampleProvider>);
        let err = stream.next().await.unwrap().err().unwrap();
        assert!(err.to_string().contains("broken clip"));
    }
}
