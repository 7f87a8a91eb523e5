use error::HospitalError;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin, stdin};

/// Line based console input.
pub struct Prompt<R> {
    reader: R,
}

impl Prompt<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Prompt::new(BufReader::new(stdin()))
    }
}

impl<R: AsyncBufRead + Unpin> Prompt<R> {
    pub fn new(reader: R) -> Self {
        Prompt { reader }
    }

    /// Prints `question` and reads one trimmed line, `None` once the input is exhausted.
    pub async fn ask(&mut self, question: &str) -> Result<Option<String>, HospitalError> {
        print!("{}", question);
        std::io::stdout().flush()?;

        let mut line = String::new();
        if self.reader.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lines_are_trimmed() {
        let mut prompt = Prompt::new(&b"  P001 \r\n\n"[..]);

        assert_eq!(prompt.ask("id: ").await.unwrap(), Some("P001".to_string()));
        assert_eq!(prompt.ask("id: ").await.unwrap(), Some(String::new()));
    }

    #[tokio::test]
    async fn test_end_of_input() {
        let mut prompt = Prompt::new(&b"last"[..]);

        assert_eq!(prompt.ask("> ").await.unwrap(), Some("last".to_string()));
        assert_eq!(prompt.ask("> ").await.unwrap(), None);
        assert_eq!(prompt.ask("> ").await.unwrap(), None);
    }
}
