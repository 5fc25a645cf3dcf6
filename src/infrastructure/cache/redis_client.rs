// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::Result;
use redis::AsyncCommands;

/// Redis客户端
///
/// 提供对Redis数据库的异步操作接口
#[derive(Clone)]
pub struct RedisClient {
    /// Redis客户端
    client: redis::Client,
}

impl RedisClient {
    /// 创建新的Redis客户端实例
    ///
    /// # 参数
    ///
    /// * `redis_url` - Redis连接URL
    ///
    /// # 返回值
    ///
    /// * `Ok(RedisClient)` - Redis客户端实例
    /// * `Err(anyhow::Error)` - URL无法解析
    pub fn new(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self { client })
    }

    /// 获取指定键的值
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let value: Option<String> = con.get(key).await?;
        Ok(value)
    }

    /// 设置键值对并指定过期时间
    ///
    /// # 参数
    ///
    /// * `key` - 键
    /// * `value` - 值
    /// * `ttl_seconds` - 过期时间（秒）
    pub async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        con.set_ex::<_, _, ()>(key, value, ttl_seconds).await?;
        Ok(())
    }

    /// 删除键
    pub async fn delete(&self, key: &str) -> Result<()> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        con.del::<_, ()>(key).await?;
        Ok(())
    }

    /// 递增计数器，首次创建时设置过期时间
    ///
    /// # 参数
    ///
    /// * `key` - 计数器键
    /// * `ttl_seconds` - 计数器窗口长度（秒）
    ///
    /// # 返回值
    ///
    /// * `Ok(i64)` - 递增后的值
    /// * `Err(anyhow::Error)` - 操作失败
    pub async fn incr_with_expiry(&self, key: &str, ttl_seconds: i64) -> Result<i64> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let value: i64 = con.incr(key, 1).await?;
        if value == 1 {
            con.expire::<_, ()>(key, ttl_seconds).await?;
        }
        Ok(value)
    }
}
