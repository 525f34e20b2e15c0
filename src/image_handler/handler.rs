//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `ImageHandler` 只负责流程编排与配置管理，不与具体页面或渲染器绑定。
//! 处理链路固定为：
//! 1. 读取配置快照
//! 2. 按来源加载原始字节
//! 3. 解码（含像素与内存上限）
//! 4. 铺满缩放 + 居中裁剪
//! 5. PNG 重新编码为 Data URL
//!
//! ## 实现思路
//!
//! - 配置通过 `Arc<RwLock<ImageConfig>>` 支持运行时动态切档。
//! - 单次请求内使用“同一配置快照”，避免处理中途配置漂移。
//! - 记录 `load/decode/resize/encode/total` 阶段耗时，便于性能诊断。
//! - 无输入时直接返回 `Ok(None)`：调用方据此理解为“没有请求 logo”。

use std::sync::{Arc, RwLock};
use std::time::Instant;

use super::{ImageConfig, ImageError, ImagePerformanceProfile, ImageSource, SquareImage};

/// logo 规范化处理器。
#[derive(Clone)]
pub struct ImageHandler {
    pub(super) config: Arc<RwLock<ImageConfig>>,
}

impl ImageHandler {
    /// 根据初始配置创建处理器。
    pub fn new(config: ImageConfig) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
        }
    }

    /// 获取配置快照。
    ///
    /// 作用：保证单次请求链路使用一致参数。
    pub(super) fn config_snapshot(&self) -> Result<ImageConfig, ImageError> {
        self.config
            .read()
            .map(|cfg| cfg.clone())
            .map_err(|_| ImageError::ResourceLimit("配置读取锁已中毒".to_string()))
    }

    /// 设置性能档位。
    pub fn set_performance_profile(&self, profile: ImagePerformanceProfile) -> Result<(), ImageError> {
        let mut config = self
            .config
            .write()
            .map_err(|_| ImageError::ResourceLimit("配置写入锁已中毒".to_string()))?;
        config.apply_performance_profile(profile);

        log::info!(
            "⚙️ 已切换 logo 处理档位：{:?}（filter={:?}）",
            profile,
            config.resize_filter
        );

        Ok(())
    }

    /// 获取当前生效档位。
    pub fn get_performance_profile(&self) -> Result<ImagePerformanceProfile, ImageError> {
        let config = self
            .config
            .read()
            .map_err(|_| ImageError::ResourceLimit("配置读取锁已中毒".to_string()))?;
        Ok(config.infer_performance_profile())
    }

    /// 处理主入口：把任意来源的图片规范化为 `target_size × target_size` 的 PNG Data URL。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use qr_platform::image_handler::{ImageConfig, ImageHandler, ImageSource};
    ///
    /// let handler = ImageHandler::new(ImageConfig::default());
    /// let square = handler.normalize_to_square(Some(ImageSource::FilePath("logo.jpg".into())), 140)?;
    /// assert!(square.is_some());
    ///
    /// assert!(handler.normalize_to_square(None, 140)?.is_none());
    /// # Ok::<(), qr_platform::image_handler::ImageError>(())
    /// ```
    pub fn normalize_to_square(
        &self,
        source: Option<ImageSource>,
        target_size: u32,
    ) -> Result<Option<SquareImage>, ImageError> {
        let Some(source) = source else {
            return Ok(None);
        };

        let config = self.config_snapshot()?;
        if target_size == 0 || target_size > config.max_target_size {
            return Err(ImageError::InvalidFormat(format!(
                "目标尺寸必须在 1~{} 之间：{}",
                config.max_target_size, target_size
            )));
        }

        let total_start = Instant::now();

        let load_start = Instant::now();
        let raw = match source {
            ImageSource::Base64(data) => self.load_from_base64(&data, &config)?,
            ImageSource::FilePath(path) => self.load_from_file(&path, &config)?,
            ImageSource::Bytes(bytes) => self.load_from_bytes(bytes, &config)?,
        };
        let load_elapsed = load_start.elapsed();

        let decode_start = Instant::now();
        let decoded = self.decode_with_limits(&raw, &config)?;
        let decode_elapsed = decode_start.elapsed();

        let resize_start = Instant::now();
        let square = Self::fill_square(&decoded, target_size, config.resize_filter)?;
        let resize_elapsed = resize_start.elapsed();

        let encode_start = Instant::now();
        let data_uri = Self::encode_png_data_uri(&square)?;
        let encode_elapsed = encode_start.elapsed();

        log::info!(
            "✅ logo 规范化完成 - 来源: {} 输出: {}x{} load={}ms decode={}ms resize={}ms encode={}ms total={}ms",
            raw.source_hint,
            target_size,
            target_size,
            load_elapsed.as_millis(),
            decode_elapsed.as_millis(),
            resize_elapsed.as_millis(),
            encode_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        Ok(Some(SquareImage {
            size: target_size,
            data_uri,
        }))
    }

    /// 异步版本：在 blocking 线程池中执行解码与重采样，避免阻塞运行时。
    pub async fn normalize_to_square_async(
        &self,
        source: Option<ImageSource>,
        target_size: u32,
    ) -> Result<Option<SquareImage>, ImageError> {
        if source.is_none() {
            return Ok(None);
        }

        let handler = self.clone();
        tokio::task::spawn_blocking(move || handler.normalize_to_square(source, target_size))
            .await
            .map_err(|e| ImageError::Decode(format!("logo 处理线程异常退出：{}", e)))?
    }
}
