//! # logo 规范化模块（image_handler）
//!
//! ## 设计思路
//!
//! 该模块将“来源识别 → 加载校验 → 解码 → 铺满裁剪 → PNG Data URL”
//! 按职责拆分为多个子模块，避免单文件膨胀与耦合。
//!
//! - `handler`：编排整条处理流水线
//! - `loader`：负责 Base64/文件/字节加载与签名校验
//! - `pipeline`：负责解码、像素限制、铺满裁剪与编码
//! - `config/error/source`：配置、错误、中间数据模型
//!
//! ## 调用链
//!
//! ```text
//! PageSession::generate
//!    ↓
//! handler.rs（配置快照 + 阶段耗时日志）
//!    ├─ loader.rs（来源加载 + 体积/签名校验）
//!    └─ pipeline.rs（解码 + 像素限制 + 铺满裁剪 + PNG 编码）
//!    ↓
//! Option<SquareImage>（None = 没有请求 logo）
//! ```
//!
//! 该组件是叶子节点，不依赖二维码渲染相关的任何类型。

mod config;
mod error;
mod handler;
mod loader;
mod pipeline;
mod source;

pub use config::{DEFAULT_TARGET_SIZE, ImageConfig, ImagePerformanceProfile};
pub use error::ImageError;
pub use handler::ImageHandler;
pub use pipeline::{FillCrop, compute_fill_crop, decode_data_uri_image};
pub use source::{ImageSource, SquareImage};
