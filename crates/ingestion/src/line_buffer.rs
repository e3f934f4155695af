//! 行缓冲：把任意切分的字节块重新组装成完整的行

use bytes::{Buf, BytesMut};

use crate::error::{IngestionError, Result};

/// 单行最大字节数 (1 MiB)
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// 行缓冲
///
/// - 行以 `\n` 结尾，末尾的 `\r` 会被去掉
/// - 超过上限的行返回 [`IngestionError::LineTooLong`]
/// - 非 UTF-8 字节按 lossy 方式替换
#[derive(Debug)]
pub struct LineBuffer {
    buf: BytesMut,
    /// 已扫描过、确认不含换行符的前缀长度
    scanned: usize,
    max_line: usize,
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl LineBuffer {
    /// 使用默认上限创建
    pub fn new() -> Self {
        Self::with_limit(MAX_LINE_BYTES)
    }

    /// 使用自定义上限创建
    pub fn with_limit(max_line: usize) -> Self {
        Self {
            buf: BytesMut::new(),
            scanned: 0,
            max_line,
        }
    }

    /// 追加字节块
    pub fn extend(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// 缓冲中尚未成行的字节数
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// 取出下一完整行；没有完整行时返回 `None`
    pub fn next_line(&mut self) -> Result<Option<String>> {
        let newline = self.buf[self.scanned..]
            .iter()
            .position(|b| *b == b'\n')
            .map(|pos| self.scanned + pos);

        match newline {
            Some(pos) => {
                let line = self.buf.split_to(pos);
                self.buf.advance(1);
                self.scanned = 0;
                self.decode(&line).map(Some)
            }
            None => {
                self.scanned = self.buf.len();
                if self.buf.len() > self.max_line + 1 {
                    return Err(IngestionError::LineTooLong {
                        limit: self.max_line,
                    });
                }
                Ok(None)
            }
        }
    }

    /// 流结束：取出末尾未以换行结束的行
    pub fn finish(&mut self) -> Result<Option<String>> {
        if self.buf.is_empty() {
            return Ok(None);
        }
        let line = self.buf.split();
        self.scanned = 0;
        self.decode(&line).map(Some)
    }

    fn decode(&self, line: &[u8]) -> Result<String> {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.len() > self.max_line {
            return Err(IngestionError::LineTooLong {
                limit: self.max_line,
            });
        }
        Ok(String::from_utf8_lossy(line).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(buffer: &mut LineBuffer) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(line) = buffer.next_line().unwrap() {
            lines.push(line);
        }
        lines
    }

    #[test]
    fn test_split_across_chunks() {
        let mut buffer = LineBuffer::new();
        buffer.extend(b"data: {\"a\"");
        assert!(drain(&mut buffer).is_empty());

        buffer.extend(b":1}\nevent: me");
        assert_eq!(drain(&mut buffer), vec!["data: {\"a\":1}"]);

        buffer.extend(b"ta\n\n");
        assert_eq!(drain(&mut buffer), vec!["event: meta", ""]);
        assert_eq!(buffer.pending(), 0);
    }

    #[test]
    fn test_crlf_stripped() {
        let mut buffer = LineBuffer::new();
        buffer.extend(b"event: error\r\ndata: boom\r\n\r\n");
        assert_eq!(drain(&mut buffer), vec!["event: error", "data: boom", ""]);
    }

    #[test]
    fn test_finish_returns_unterminated_line() {
        let mut buffer = LineBuffer::new();
        buffer.extend(b"data: one\ndata: two");
        assert_eq!(drain(&mut buffer), vec!["data: one"]);
        assert_eq!(buffer.finish().unwrap().as_deref(), Some("data: two"));
        assert_eq!(buffer.finish().unwrap(), None);
    }

    #[test]
    fn test_line_at_limit_accepted() {
        let mut buffer = LineBuffer::with_limit(8);
        buffer.extend(b"12345678\n");
        assert_eq!(drain(&mut buffer), vec!["12345678"]);
    }

    #[test]
    fn test_line_too_long() {
        let mut buffer = LineBuffer::with_limit(8);
        buffer.extend(b"123456789\n");
        assert!(matches!(
            buffer.next_line(),
            Err(IngestionError::LineTooLong { limit: 8 })
        ));
    }

    #[test]
    fn test_unterminated_line_too_long() {
        let mut buffer = LineBuffer::with_limit(4);
        buffer.extend(b"0123456789");
        assert!(buffer.next_line().is_err());
    }

    #[test]
    fn test_default_tolerates_one_mib_line() {
        let mut buffer = LineBuffer::new();
        let mut line = vec![b'x'; MAX_LINE_BYTES];
        line.push(b'\n');
        buffer.extend(&line);
        assert_eq!(buffer.next_line().unwrap().map(|l| l.len()), Some(MAX_LINE_BYTES));
    }
}
