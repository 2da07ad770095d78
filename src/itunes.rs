//! iTunes playlist exports.
//!
//! iTunes ("File > Library > Export Playlist...") writes a tab-separated
//! table with a header row. Older versions end records with a bare `\r`
//! and encode the file as UTF-16 with a byte-order mark; both are
//! accepted here. Only the `Name`, `Artist` and `Album` columns are read.

use std::collections::HashMap;
use std::io::Read;

use crate::error::ItunesError;
use crate::models::Song;

/// Read and parse an export from any reader.
pub fn read_playlist<R: Read>(mut reader: R) -> Result<Vec<Song>, ItunesError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    Ok(parse_playlist(&decode_export(&bytes)?))
}

/// Decode raw export bytes to text.
///
/// UTF-16 needs a byte-order mark; everything else must be UTF-8.
pub fn decode_export(bytes: &[u8]) -> Result<String, ItunesError> {
    match bytes {
        [0xFF, 0xFE, rest @ ..] => decode_utf16(rest, u16::from_le_bytes),
        [0xFE, 0xFF, rest @ ..] => decode_utf16(rest, u16::from_be_bytes),
        [0xEF, 0xBB, 0xBF, rest @ ..] => {
            String::from_utf8(rest.to_vec()).map_err(|_| ItunesError::Encoding)
        }
        _ => String::from_utf8(bytes.to_vec()).map_err(|_| ItunesError::Encoding),
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> Result<String, ItunesError> {
    if bytes.len() % 2 != 0 {
        return Err(ItunesError::Encoding);
    }
    let units = bytes.chunks_exact(2).map(|pair| unit([pair[0], pair[1]]));
    char::decode_utf16(units)
        .collect::<Result<String, _>>()
        .map_err(|_| ItunesError::Encoding)
}

/// Parse export text into songs, in file order.
///
/// The first non-empty record is the header. Missing cells read as empty
/// strings. Empty lines are skipped; a line of bare tabs is a song with
/// empty fields.
pub fn parse_playlist(text: &str) -> Vec<Song> {
    let mut records = split_records(text).into_iter();

    let Some(header) = records.next() else {
        return Vec::new();
    };
    let columns = column_positions(&header);

    records
        .map(|row| Song {
            name: cell(&row, &columns, "Name"),
            artist: cell(&row, &columns, "Artist"),
            album: cell(&row, &columns, "Album"),
        })
        .collect()
}

/// Split export text into records of tab-separated fields.
///
/// Records end at `\r` or `\n` outside quotes. A field starting with `"`
/// runs until a `"` followed by a tab, a line break or the end of input,
/// so quoted cells may span lines; `""` inside it is a literal quote.
/// Quotes anywhere else are kept as-is.
fn split_records(text: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut blank = true;
    let mut quoted = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if quoted {
            if c != '"' {
                field.push(c);
                continue;
            }
            match chars.peek() {
                Some('"') => {
                    chars.next();
                    field.push('"');
                }
                None | Some('\t' | '\r' | '\n') => quoted = false,
                Some(_) => field.push('"'),
            }
            continue;
        }

        match c {
            '\r' | '\n' => {
                if !blank {
                    record.push(std::mem::take(&mut field));
                    records.push(std::mem::take(&mut record));
                }
                blank = true;
            }
            '\t' => {
                record.push(std::mem::take(&mut field));
                blank = false;
            }
            '"' if field.is_empty() => {
                quoted = true;
                blank = false;
            }
            _ => {
                field.push(c);
                blank = false;
            }
        }
    }

    if !blank {
        record.push(field);
        records.push(record);
    }
    records
}

/// Map scrubbed header names (ASCII letters and digits only) to columns.
fn column_positions(header: &[String]) -> HashMap<String, usize> {
    header
        .iter()
        .enumerate()
        .map(|(position, name)| {
            let scrubbed: String = name.chars().filter(char::is_ascii_alphanumeric).collect();
            (scrubbed, position)
        })
        .collect()
}

fn cell(row: &[String], columns: &HashMap<String, usize>, column: &str) -> String {
    columns
        .get(column)
        .and_then(|&position| row.get(position))
        .cloned()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = "Name\tArtist\tComposer\tAlbum\tGenre\r\
        Hey Jude\tThe Beatles\tLennon/McCartney\t1\tRock\r\
        Clair de Lune\tClaude Debussy\t\tSuite bergamasque\tClassical\r";

    #[test]
    fn test_parse_carriage_return_records() {
        let songs = parse_playlist(EXPORT);
        assert_eq!(
            songs,
            vec![
                Song::new("Hey Jude", "The Beatles", "1"),
                Song::new("Clair de Lune", "Claude Debussy", "Suite bergamasque"),
            ]
        );
    }

    #[test]
    fn test_parse_crlf_and_lf_records() {
        let text = "Name\tArtist\tAlbum\r\nA\tB\tC\nD\tE\tF\n";
        let songs = parse_playlist(text);
        assert_eq!(songs.len(), 2);
        assert_eq!(songs[1], Song::new("D", "E", "F"));
    }

    #[test]
    fn test_header_names_are_scrubbed() {
        let text = "\u{feff}\"Name\"\tArtist \tAlbum:\nSong\tSinger\tRecord\n";
        assert_eq!(parse_playlist(text), vec![Song::new("Song", "Singer", "Record")]);
    }

    #[test]
    fn test_short_rows_and_missing_columns() {
        let text = "Artist\tName\nOnly Artist\n";
        assert_eq!(parse_playlist(text), vec![Song::new("", "Only Artist", "")]);
    }

    #[test]
    fn test_quoted_fields() {
        let text = "Name\tArtist\n\"Say \"\"Hi\"\"\"\tHe said \"yo\"\n";
        let songs = parse_playlist(text);
        assert_eq!(songs[0].name, "Say \"Hi\"");
        assert_eq!(songs[0].artist, "He said \"yo\"");
    }

    #[test]
    fn test_quoted_cell_spanning_lines() {
        let text = "Name\tArtist\tComments\tAlbum\r\
            Song\tSinger\t\"first line\rsecond line\nthird\"\tRecord\r\
            Next\tBand\t\tLP\r";
        assert_eq!(
            parse_playlist(text),
            vec![
                Song::new("Song", "Singer", "Record"),
                Song::new("Next", "Band", "LP"),
            ]
        );
    }

    #[test]
    fn test_tab_only_row_is_a_song() {
        let text = "Name\tArtist\tAlbum\n\t\t\nA\tB\tC\n";
        assert_eq!(
            parse_playlist(text),
            vec![Song::new("", "", ""), Song::new("A", "B", "C")]
        );
    }

    #[test]
    fn test_stray_quote_in_quoted_field() {
        let text = "Name\tArtist\n\"12\" Mix\"\tDJ\n";
        assert_eq!(parse_playlist(text), vec![Song::new("12\" Mix", "DJ", "")]);
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_playlist("").is_empty());
        assert!(parse_playlist("Name\tArtist\tAlbum\r").is_empty());
    }

    #[test]
    fn test_decode_utf16_le_export() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "Name\tArtist\rÉté\tX\r".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }

        let songs = read_playlist(bytes.as_slice()).unwrap();
        assert_eq!(songs, vec![Song::new("Été", "X", "")]);
    }

    #[test]
    fn test_decode_rejects_invalid_utf8() {
        assert!(matches!(
            decode_export(&[0x4E, 0xFF, 0x00]),
            Err(ItunesError::Encoding)
        ));
    }
}
