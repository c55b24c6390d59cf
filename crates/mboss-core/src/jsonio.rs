// Loading and storing JSON documents.
// Origin: jsonio.h

use std::io::{Read, Write};
use std::path::Path;

use serde_json::Value;

use crate::CoreError;
use crate::schema::{self, SchemaKind};

/// A value with a schema-checked JSON form.
///
/// Implementors supply the conversion from an already validated document
/// and back; loading from strings, readers and files is provided. A load
/// either returns a complete value or an error, never a partial one.
pub trait JsonDocument: Sized {
    type Error: From<CoreError>;

    /// Schema the document is validated against before conversion.
    const SCHEMA: SchemaKind;

    /// Build the value from a document that passed [`Self::SCHEMA`].
    fn from_validated_json(value: &Value) -> Result<Self, Self::Error>;

    fn to_json_value(&self) -> Result<Value, Self::Error>;

    fn from_json_value(value: &Value) -> Result<Self, Self::Error> {
        schema::validate(Self::SCHEMA, value)?;
        Self::from_validated_json(value)
    }

    fn from_json_str(text: &str) -> Result<Self, Self::Error> {
        let value: Value = serde_json::from_str(text).map_err(CoreError::from)?;
        Self::from_json_value(&value)
    }

    fn from_reader<R: Read>(reader: R) -> Result<Self, Self::Error> {
        let value: Value = serde_json::from_reader(reader).map_err(CoreError::from)?;
        Self::from_json_value(&value)
    }

    /// Load from a file.
    ///
    /// Fails with [`CoreError::FileNotFound`] if `path` does not exist.
    fn from_file(path: impl AsRef<Path>) -> Result<Self, Self::Error> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CoreError::FileNotFound(path.to_path_buf()).into());
        }
        let text = std::fs::read_to_string(path).map_err(|source| CoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    fn to_json_string(&self) -> Result<String, Self::Error> {
        Ok(self.to_json_value()?.to_string())
    }

    /// Write the compact JSON form followed by a newline.
    fn write_json<W: Write>(&self, mut writer: W) -> Result<(), Self::Error> {
        let value = self.to_json_value()?;
        serde_json::to_writer(&mut writer, &value).map_err(CoreError::from)?;
        writeln!(writer).map_err(|e| CoreError::Json(serde_json::Error::io(e)))?;
        Ok(())
    }

    fn to_file(&self, path: impl AsRef<Path>) -> Result<(), Self::Error> {
        let path = path.as_ref();
        let file = std::fs::File::create(path).map_err(|source| CoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut writer = std::io::BufWriter::new(file);
        self.write_json(&mut writer)?;
        writer.flush().map_err(|source| CoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(())
    }
}
