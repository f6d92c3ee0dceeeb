//! Route table lookup and enumeration

use super::{BRANCH_OFFSET_SIZE, VALUE_OFFSET_SIZE};
use crate::codec::TypeTag;
use crate::error::{MapError, MapResult};
use crate::key::{CHUNK_SIZE, key_chunk, pack_chunk};
use crate::token::{ChunkKind, RouteToken};

/// Location of a value found through the route table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteHit {
    /// Type tag stored with the key
    pub tag: TypeTag,
    /// Offset of the value from the start of the data region
    pub value_offset: u32,
}

/// Read-only view over encoded route table bytes
#[derive(Debug, Clone, Copy)]
pub struct RouteReader<'a> {
    route: &'a [u8],
    max_depth: usize,
}

#[derive(Debug)]
struct EntryView<'a> {
    last: bool,
    chunk: &'a [u8],
    hit: Option<RouteHit>,
    next: usize,
    has_children: bool,
    body_end: usize,
}

enum Frame {
    Group {
        pos: usize,
        depth: usize,
        prefix_len: usize,
    },
    Sibling {
        next: usize,
        last: bool,
        depth: usize,
        prefix_len: usize,
    },
    Else {
        else_pos: usize,
        depth: usize,
        prefix_len: usize,
    },
}

impl<'a> RouteReader<'a> {
    /// Reader over `route`, trusting keys no deeper than `max_depth` chunks
    pub fn new(route: &'a [u8], max_depth: usize) -> Self {
        Self { route, max_depth }
    }

    /// Encoded route bytes
    pub fn as_bytes(&self) -> &'a [u8] {
        self.route
    }

    /// Follow the route for `key`.
    ///
    /// Only the tokens on the path taken are decoded; every jump moves
    /// strictly forward, so lookups terminate on any input.
    pub fn find(&self, key: &[u8]) -> MapResult<Option<RouteHit>> {
        if key.is_empty() || self.route.is_empty() {
            return Ok(None);
        }

        let mut pos = 0;
        let mut depth = 0;
        loop {
            let chunk = key_chunk(key, depth);
            let probe = (pack_chunk(chunk), chunk.len() as u8);

            match self.token(pos)? {
                RouteToken::LessThan(n) => {
                    let target = self.branch(pos + 1)?;
                    let pivot = self.bytes(pos + 1 + BRANCH_OFFSET_SIZE, usize::from(n))?;
                    if probe <= (pack_chunk(pivot), n) {
                        pos += 1 + BRANCH_OFFSET_SIZE + usize::from(n);
                    } else {
                        self.expect_less_else(target)?;
                        pos = target + 1;
                    }
                }
                token @ (RouteToken::EqualNext(_) | RouteToken::EqualLast(_)) => {
                    let entry = self.read_entry(pos, token)?;
                    if entry.chunk == chunk {
                        if key.len() <= (depth + 1) * CHUNK_SIZE {
                            return Ok(entry.hit);
                        }
                        if !entry.has_children {
                            return Ok(None);
                        }
                        self.check_depth(pos, depth)?;
                        depth += 1;
                        pos = entry.body_end;
                    } else if entry.last {
                        return Ok(None);
                    } else {
                        pos = entry.next;
                    }
                }
                _ => return Err(MapError::malformed(pos, "unexpected token")),
            }
        }
    }

    /// Walk every branch and collect each stored key with its hit.
    ///
    /// Unlike [`find`](Self::find) this validates every branch offset
    /// against the end of the subtree it skips.
    pub fn entries(&self) -> MapResult<Vec<(Vec<u8>, RouteHit)>> {
        let mut out = Vec::new();
        if self.route.is_empty() {
            return Ok(out);
        }

        let mut prefix = Vec::new();
        let mut group_end = 0;
        let mut stack = vec![Frame::Group {
            pos: 0,
            depth: 0,
            prefix_len: 0,
        }];

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Group {
                    pos,
                    depth,
                    prefix_len,
                } => {
                    prefix.truncate(prefix_len);
                    match self.token(pos)? {
                        RouteToken::LessThan(n) => {
                            let else_pos = self.branch(pos + 1)?;
                            let left = pos + 1 + BRANCH_OFFSET_SIZE + usize::from(n);
                            self.bytes(pos + 1 + BRANCH_OFFSET_SIZE, usize::from(n))?;
                            stack.push(Frame::Else {
                                else_pos,
                                depth,
                                prefix_len,
                            });
                            stack.push(Frame::Group {
                                pos: left,
                                depth,
                                prefix_len,
                            });
                        }
                        token @ (RouteToken::EqualNext(_) | RouteToken::EqualLast(_)) => {
                            let entry = self.read_entry(pos, token)?;
                            prefix.extend_from_slice(entry.chunk);
                            if let Some(hit) = entry.hit {
                                out.push((prefix.clone(), hit));
                            }

                            stack.push(Frame::Sibling {
                                next: entry.next,
                                last: entry.last,
                                depth,
                                prefix_len,
                            });
                            if entry.has_children {
                                self.check_depth(pos, depth)?;
                                stack.push(Frame::Group {
                                    pos: entry.body_end,
                                    depth: depth + 1,
                                    prefix_len: prefix.len(),
                                });
                            } else {
                                group_end = entry.body_end;
                            }
                        }
                        _ => return Err(MapError::malformed(pos, "unexpected token")),
                    }
                }
                Frame::Sibling {
                    next,
                    last,
                    depth,
                    prefix_len,
                } => {
                    if group_end != next {
                        return Err(MapError::malformed(
                            next,
                            "branch offset does not match subtree end",
                        ));
                    }
                    if !last {
                        stack.push(Frame::Group {
                            pos: next,
                            depth,
                            prefix_len,
                        });
                    }
                }
                Frame::Else {
                    else_pos,
                    depth,
                    prefix_len,
                } => {
                    if group_end != else_pos {
                        return Err(MapError::malformed(
                            else_pos,
                            "branch offset does not match left subtree end",
                        ));
                    }
                    self.expect_less_else(else_pos)?;
                    stack.push(Frame::Group {
                        pos: else_pos + 1,
                        depth,
                        prefix_len,
                    });
                }
            }
        }

        if group_end != self.route.len() {
            return Err(MapError::malformed(group_end, "trailing bytes after route"));
        }
        Ok(out)
    }

    fn byte(&self, pos: usize) -> MapResult<u8> {
        self.route
            .get(pos)
            .copied()
            .ok_or(MapError::Truncated {
                offset: pos,
                needed: 1,
            })
    }

    fn bytes(&self, pos: usize, len: usize) -> MapResult<&'a [u8]> {
        self.route
            .get(pos..pos + len)
            .ok_or_else(|| MapError::Truncated {
                offset: pos,
                needed: (pos + len).saturating_sub(self.route.len()),
            })
    }

    fn token(&self, pos: usize) -> MapResult<RouteToken> {
        RouteToken::from_byte(self.byte(pos)?, pos)
    }

    /// Resolve the branch slot at `pos` to an absolute route position
    fn branch(&self, pos: usize) -> MapResult<usize> {
        let slot = self.bytes(pos, BRANCH_OFFSET_SIZE)?;
        let target = pos + BRANCH_OFFSET_SIZE + usize::from(u16::from_le_bytes([slot[0], slot[1]]));
        if target > self.route.len() {
            return Err(MapError::malformed(pos, "branch offset past end of route"));
        }
        Ok(target)
    }

    fn expect_less_else(&self, pos: usize) -> MapResult<()> {
        match self.token(pos)? {
            RouteToken::LessElse => Ok(()),
            _ => Err(MapError::malformed(pos, "branch does not land on less-else")),
        }
    }

    fn check_depth(&self, pos: usize, depth: usize) -> MapResult<()> {
        if depth + 1 >= self.max_depth {
            return Err(MapError::malformed(pos, "route deeper than max depth"));
        }
        Ok(())
    }

    fn read_entry(&self, pos: usize, token: RouteToken) -> MapResult<EntryView<'a>> {
        let (last, kind) = match token {
            RouteToken::EqualNext(kind) => (false, kind),
            RouteToken::EqualLast(kind) => (true, kind),
            _ => return Err(MapError::malformed(pos, "expected equal token")),
        };
        let byte_count = usize::from(kind.byte_count());

        let next = self.branch(pos + 1)?;
        let mut cursor = pos + 1 + BRANCH_OFFSET_SIZE;
        let chunk = self.bytes(cursor, byte_count)?;
        cursor += byte_count;

        let hit = match kind {
            ChunkKind::Key(_) => {
                let tag = TypeTag::read(self.route.get(cursor..).unwrap_or_default(), cursor)?;
                cursor += tag.encoded_len();
                let slot = self.bytes(cursor, VALUE_OFFSET_SIZE)?;
                cursor += VALUE_OFFSET_SIZE;
                Some(RouteHit {
                    tag,
                    value_offset: u32::from_le_bytes([slot[0], slot[1], slot[2], slot[3]]),
                })
            }
            ChunkKind::PassThrough => None,
        };

        let has_children = match self.token(cursor)? {
            RouteToken::HasChildren => true,
            RouteToken::NoChildren => false,
            _ => return Err(MapError::malformed(cursor, "expected child marker")),
        };
        cursor += 1;

        if !kind.is_key() && !has_children {
            return Err(MapError::malformed(pos, "pass-through entry without children"));
        }
        if has_children && byte_count != CHUNK_SIZE {
            return Err(MapError::malformed(pos, "partial chunk with children"));
        }

        Ok(EntryView {
            last,
            chunk,
            hit,
            next,
            has_children,
            body_end: cursor,
        })
    }
}
