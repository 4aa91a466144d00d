use serde::de::{self, SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// アプリケーションのスクリプト定義
///
/// マニフェスト上では形状そのものが種別を表す:
/// 文字列なら単一コマンド、文字列の配列なら並列実行されるコマンド群。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptSpec {
    /// 単一のコマンドライン（順次実行、標準入力を引き継ぐ）
    Single(String),
    /// 並列に実行されるコマンドラインの列
    Batch(Vec<String>),
}

impl ScriptSpec {
    /// 単一コマンドのスクリプトを作成
    pub fn single(command: impl Into<String>) -> Self {
        Self::Single(command.into())
    }

    /// バッチスクリプトを作成
    pub fn batch<I, S>(commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Batch(commands.into_iter().map(Into::into).collect())
    }

    /// バッチかどうか
    pub fn is_batch(&self) -> bool {
        matches!(self, Self::Batch(_))
    }

    /// 含まれるコマンドラインを定義順に取得
    pub fn commands(&self) -> Vec<&str> {
        match self {
            Self::Single(command) => vec![command.as_str()],
            Self::Batch(commands) => commands.iter().map(String::as_str).collect(),
        }
    }
}

impl fmt::Display for ScriptSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(command) => write!(f, "{}", command),
            Self::Batch(commands) => write!(f, "[{}]", commands.join(", ")),
        }
    }
}

impl Serialize for ScriptSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Single(command) => serializer.serialize_str(command),
            Self::Batch(commands) => {
                let mut seq = serializer.serialize_seq(Some(commands.len()))?;
                for command in commands {
                    seq.serialize_element(command)?;
                }
                seq.end()
            }
        }
    }
}

struct ScriptSpecVisitor;

impl<'de> Visitor<'de> for ScriptSpecVisitor {
    type Value = ScriptSpec;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a command string or an array of command strings")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        Ok(ScriptSpec::Single(value.to_string()))
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<Self::Value, E> {
        Ok(ScriptSpec::Single(value))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut commands = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(command) = seq.next_element::<String>()? {
            commands.push(command);
        }
        Ok(ScriptSpec::Batch(commands))
    }
}

impl<'de> Deserialize<'de> for ScriptSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ScriptSpecVisitor)
    }
}
