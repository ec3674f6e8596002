//! CSV metadata files
//!
//! Three tabular files accompany the audio: the per-speaker token info log
//! written next to the concatenated selection, the word-list rows used to
//! label bootstrap TextGrids, and the shared random item list drawn for the
//! norming subset.

use crate::error::Result;
use crate::token::SelectedToken;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One row of `{speaker}_selected_tokens_info.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub filename: String,
    pub speaker: String,
    pub item_code: String,
    #[serde(rename = "variableN")]
    pub variable_n: u32,
    #[serde(rename = "rowN")]
    pub row_n: u32,
    #[serde(rename = "variantN")]
    pub variant_n: u32,
    pub word: String,
    pub variant: String,
}

impl TokenRecord {
    pub fn from_token(token: &SelectedToken) -> Self {
        TokenRecord {
            filename: token.stem(),
            speaker: token.speaker.clone(),
            item_code: token.item_code(),
            variable_n: token.variable_n,
            row_n: token.row_n,
            variant_n: token.variant.number(),
            word: token.word.clone(),
            variant: token.variant.letter().to_string(),
        }
    }
}

/// One row of the recording word list (`recordings_wordrows.csv`).
///
/// The supplementary list carries no `Variable_Num` column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordRow {
    #[serde(rename = "Variable_Num", default)]
    pub variable_num: Option<u32>,
    #[serde(rename = "Variable_Name")]
    pub variable_name: String,
    #[serde(rename = "Word_Code")]
    pub word_code: String,
}

/// One row of the shared random item list (`N2_random_items.csv`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomItem {
    pub item_code: String,
    #[serde(rename = "variableN")]
    pub variable_n: u32,
    #[serde(rename = "rowN")]
    pub row_n: u32,
    #[serde(rename = "variantN")]
    pub variant_n: u32,
    pub word: String,
    pub random_state: u64,
}

pub fn read_token_records<P: AsRef<Path>>(path: P) -> Result<Vec<TokenRecord>> {
    read_records(path)
}

pub fn write_token_records<P: AsRef<Path>>(path: P, records: &[TokenRecord]) -> Result<()> {
    write_records(path, records)
}

pub fn read_word_rows<P: AsRef<Path>>(path: P) -> Result<Vec<WordRow>> {
    read_records(path)
}

pub fn read_random_items<P: AsRef<Path>>(path: P) -> Result<Vec<RandomItem>> {
    read_records(path)
}

pub fn write_random_items<P: AsRef<Path>>(path: P, items: &[RandomItem]) -> Result<()> {
    write_records(path, items)
}

fn read_records<P: AsRef<Path>, T: for<'de> Deserialize<'de>>(path: P) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_path(path.as_ref())?;
    let mut records = Vec::new();
    for row in reader.deserialize() {
        records.push(row?);
    }
    Ok(records)
}

fn write_records<P: AsRef<Path>, T: Serialize>(path: P, records: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path.as_ref())?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::RecordedToken;
    use tempfile::TempDir;

    #[test]
    fn test_token_record_from_token() {
        let token = RecordedToken::parse("S1-2_3-5_thing-ting_3a")
            .unwrap()
            .to_selected()
            .unwrap();
        let record = TokenRecord::from_token(&token);
        assert_eq!(record.filename, "S1_3-5-3_thing_N");
        assert_eq!(record.speaker, "S1");
        assert_eq!(record.item_code, "3-5-3");
        assert_eq!(record.variant_n, 3);
        assert_eq!(record.variant, "N");
    }

    #[test]
    fn test_token_record_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("info.csv");

        let token = RecordedToken::parse("S1_3-5_thing-ting_1")
            .unwrap()
            .to_selected()
            .unwrap();
        let records = vec![TokenRecord::from_token(&token)];
        write_token_records(&path, &records).unwrap();

        let header = std::fs::read_to_string(&path).unwrap();
        assert!(header
            .starts_with("filename,speaker,item_code,variableN,rowN,variantN,word,variant"));

        let loaded = read_token_records(&path).unwrap();
        assert_eq!(loaded, records);
    }

    #[test]
    fn test_read_word_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wordrows.csv");
        std::fs::write(
            &path,
            "Variable_Num,Variable_Name,Word_Code\n3,TH-stopping,thing-ting\n3,TH-stopping,think-tink\n",
        )
        .unwrap();

        let rows = read_word_rows(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].variable_num, Some(3));
        assert_eq!(rows[0].variable_name, "TH-stopping");
        assert_eq!(rows[1].word_code, "think-tink");
    }

    #[test]
    fn test_random_items_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("items.csv");
        let items = vec![RandomItem {
            item_code: "5-2-1".to_string(),
            variable_n: 5,
            row_n: 2,
            variant_n: 1,
            word: "goose".to_string(),
            random_state: 6,
        }];
        write_random_items(&path, &items).unwrap();
        let loaded = read_random_items(&path).unwrap();
        assert_eq!(loaded, items);
    }
}
