//! Fixed-size character window chunking

/// Splits text into overlapping windows measured in characters
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Window size in characters
    chunk_size: usize,
    /// Characters shared by consecutive windows
    overlap: usize,
}

impl TextChunker {
    /// Create a new chunker.
    ///
    /// An overlap not smaller than the window is clamped so the window always advances.
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            overlap: overlap.min(chunk_size - 1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split `text` into windows starting every `chunk_size - overlap` characters.
    ///
    /// Windows are trimmed and whitespace-only windows are dropped.
    pub fn split(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let step = self.chunk_size - self.overlap;
        let mut chunks = Vec::with_capacity(chars.len() / step + 1);

        let mut start = 0;
        while start < chars.len() {
            let end = (start + self.chunk_size).min(chars.len());
            let window: String = chars[start..end].iter().collect();
            let trimmed = window.trim();
            if !trimmed.is_empty() {
                chunks.push(trimmed.to_string());
            }
            start += step;
        }

        chunks
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::new(800, 120)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_positions() {
        let text = "a".repeat(2000);
        let chunks = TextChunker::new(800, 120).split(&text);
        let lens: Vec<usize> = chunks.iter().map(|c| c.chars().count()).collect();
        assert_eq!(lens, vec![800, 800, 640]);
    }

    #[test]
    fn test_overlap_is_shared() {
        let text: String = ('a'..='z').collect();
        let chunks = TextChunker::new(10, 3).split(&text);
        assert_eq!(chunks[0], "abcdefghij");
        assert_eq!(chunks[1], "hijklmnopq");
        assert!(chunks[1].starts_with(&chunks[0][7..]));
    }

    #[test]
    fn test_multibyte_text() {
        let text = "補助金".repeat(400);
        let chunks = TextChunker::default().split(&text);
        assert_eq!(chunks[0].chars().count(), 800);
        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn test_blank_windows_skipped() {
        let mut text = "x".repeat(5);
        text.push_str(&" ".repeat(30));
        let chunks = TextChunker::new(10, 0).split(&text);
        assert_eq!(chunks, vec!["xxxxx".to_string()]);
        assert!(TextChunker::default().split("").is_empty());
    }

    #[test]
    fn test_overlap_clamped() {
        let chunker = TextChunker::new(5, 9);
        assert_eq!(chunker.overlap(), 4);
        assert_eq!(chunker.split("abcdefg").len(), 7);
    }
}
