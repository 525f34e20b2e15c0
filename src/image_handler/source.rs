//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“外部输入类型”和“流水线中间结果”解耦：
//! - `ImageSource` 表示用户选择的 logo 来源
//! - `RawImageData` 表示已加载但未解码的字节
//! - `SquareImage` 表示规范化完成、可直接嵌入二维码的正方形图片

use serde::{Deserialize, Serialize};

/// logo 输入来源。
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// Base64（支持 Data URL 与纯 Base64 字符串）。
    Base64(String),
    /// 本地文件路径来源。
    FilePath(String),
    /// 已读入内存的原始字节。
    Bytes(Vec<u8>),
}

/// 加载阶段输出：原始字节与来源标识。
pub(crate) struct RawImageData {
    /// 原始图片字节。
    pub(crate) bytes: Vec<u8>,
    /// 来源提示（用于日志与诊断）。
    pub(crate) source_hint: &'static str,
}

/// 规范化结果：`size × size` 的 PNG，编码为 Data URL。
///
/// 所有权交给调用方，通常随后被放进 `QrStyleConfig` 的 logo 字段。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SquareImage {
    /// 边长（像素）。
    pub size: u32,
    /// `data:image/png;base64,...`
    pub data_uri: String,
}

impl SquareImage {
    pub fn as_data_uri(&self) -> &str {
        &self.data_uri
    }
}
